//! Sphere collider

use super::{
    base::{sphere_column, ColliderBase},
    Collider,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tilenav_common::{Heightfield, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereCollider {
    pub base: ColliderBase,
    pub center: Vec3,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32, area: u8, flag_merge_threshold: f32) -> Self {
        Self {
            base: ColliderBase::new(area, flag_merge_threshold),
            center,
            radius: radius.abs(),
        }
    }
}

impl Collider for SphereCollider {
    fn bounds(&self) -> (Vec3, Vec3) {
        let r = Vec3::splat(self.radius);
        (self.center - r, self.center + r)
    }

    fn rasterize(&self, heightfield: &mut Heightfield) -> Result<()> {
        self.base.rasterize_columns(heightfield, self.bounds(), |px, pz| {
            sphere_column(self.center, self.radius, px, pz)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let sphere = SphereCollider::new(Vec3::new(1.0, 2.0, 3.0), 1.5, 0, 1.0);
        let (min, max) = sphere.bounds();
        assert_eq!(min, Vec3::new(-0.5, 0.5, 1.5));
        assert_eq!(max, Vec3::new(2.5, 3.5, 4.5));
    }

    #[test]
    fn test_rasterize_is_round() {
        let mut hf = Heightfield::new(8, 8, Vec3::ZERO, Vec3::new(8.0, 8.0, 8.0), 1.0, 0.25);
        let sphere = SphereCollider::new(Vec3::new(4.0, 4.0, 4.0), 2.0, 3, 0.0);
        sphere.rasterize(&mut hf).unwrap();

        // Cell (3,3) center is ~0.71 from the axis: tall span
        let inner = hf.column(3, 3).unwrap()[0];
        // Cell (2,3) center is ~1.58 from the axis: shorter span
        let outer = hf.column(2, 3).unwrap()[0];
        assert!(inner.max - inner.min > outer.max - outer.min);
        assert_eq!(inner.area, 3);
        // Cell (2,2) center is ~2.12 from the axis: outside
        assert!(hf.column(2, 2).unwrap().is_empty());
    }
}
