//! Composite collider

use super::{Collider, SerializableCollider};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tilenav_common::{Heightfield, Result};

/// Several shapes added and removed as one obstacle
///
/// Children keep their own area and merge threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeCollider {
    pub colliders: Vec<SerializableCollider>,
}

impl CompositeCollider {
    pub fn new(colliders: Vec<SerializableCollider>) -> Self {
        Self { colliders }
    }

    pub fn push(&mut self, collider: impl Into<SerializableCollider>) {
        self.colliders.push(collider.into());
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }
}

impl Collider for CompositeCollider {
    fn bounds(&self) -> (Vec3, Vec3) {
        self.colliders
            .iter()
            .map(|c| c.as_collider().bounds())
            .reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
            .unwrap_or((Vec3::ZERO, Vec3::ZERO))
    }

    fn rasterize(&self, heightfield: &mut Heightfield) -> Result<()> {
        for collider in &self.colliders {
            collider.as_collider().rasterize(heightfield)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colliders::{BoxCollider, SphereCollider};

    #[test]
    fn test_empty_composite() {
        let composite = CompositeCollider::default();
        assert!(composite.is_empty());
        assert_eq!(composite.bounds(), (Vec3::ZERO, Vec3::ZERO));
    }

    #[test]
    fn test_rasterizes_every_child() {
        let mut composite = CompositeCollider::default();
        composite.push(BoxCollider::from_min_max(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            1,
            0.0,
        ));
        composite.push(SphereCollider::new(Vec3::new(4.5, 1.0, 4.5), 0.4, 2, 0.0));
        assert_eq!(composite.len(), 2);

        let mut hf = Heightfield::new(6, 6, Vec3::ZERO, Vec3::new(6.0, 6.0, 6.0), 1.0, 0.5);
        composite.rasterize(&mut hf).unwrap();

        assert_eq!(hf.column(0, 0).unwrap()[0].area, 1);
        assert_eq!(hf.column(4, 4).unwrap()[0].area, 2);
        assert_eq!(hf.span_count(), 2);
    }
}
