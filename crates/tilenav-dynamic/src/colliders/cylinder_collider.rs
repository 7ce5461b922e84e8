//! Cylinder collider

use super::{
    base::{cylinder_column, ColliderBase},
    Collider,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tilenav_common::{Heightfield, Result};

/// A flat-capped cylinder around the segment `start..end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderCollider {
    pub base: ColliderBase,
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl CylinderCollider {
    pub fn new(start: Vec3, end: Vec3, radius: f32, area: u8, flag_merge_threshold: f32) -> Self {
        Self {
            base: ColliderBase::new(area, flag_merge_threshold),
            start,
            end,
            radius: radius.abs(),
        }
    }
}

impl Collider for CylinderCollider {
    fn bounds(&self) -> (Vec3, Vec3) {
        // Each cap disc extends r * sqrt(1 - a_i^2) along axis i
        let axis = (self.end - self.start).normalize_or_zero();
        let e = (Vec3::ONE - axis * axis).max(Vec3::ZERO);
        let extent = Vec3::new(e.x.sqrt(), e.y.sqrt(), e.z.sqrt()) * self.radius;
        (
            self.start.min(self.end) - extent,
            self.start.max(self.end) + extent,
        )
    }

    fn rasterize(&self, heightfield: &mut Heightfield) -> Result<()> {
        self.base.rasterize_columns(heightfield, self.bounds(), |px, pz| {
            cylinder_column(self.start, self.end, self.radius, px, pz)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upright_bounds_are_tight() {
        let cylinder = CylinderCollider::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            0.5,
            0,
            1.0,
        );
        let (min, max) = cylinder.bounds();
        assert!((min - Vec3::new(-0.5, 0.0, -0.5)).length() < 1e-6);
        assert!((max - Vec3::new(0.5, 2.0, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_rasterize_flat_caps() {
        let mut hf = Heightfield::new(6, 6, Vec3::ZERO, Vec3::new(6.0, 6.0, 6.0), 1.0, 0.5);
        let cylinder = CylinderCollider::new(
            Vec3::new(3.0, 1.0, 3.0),
            Vec3::new(3.0, 3.0, 3.0),
            1.5,
            4,
            0.0,
        );
        cylinder.rasterize(&mut hf).unwrap();

        // Every covered column spans exactly the cap-to-cap height
        for z in 0..6 {
            for x in 0..6 {
                if let Some(span) = hf.column(x, z).unwrap().first() {
                    assert_eq!((span.min, span.max, span.area), (2, 6, 4));
                }
            }
        }
        assert_eq!(hf.column(2, 2).unwrap().len(), 1);
        assert!(hf.column(0, 0).unwrap().is_empty());
    }
}
