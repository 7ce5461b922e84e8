//! Collider types for dynamic obstacles
//!
//! A collider is anything that can report a world-space AABB and stamp
//! itself into a tile heightfield as solid spans. The navmesh only ever talks
//! to colliders through the [`Collider`] trait; the concrete shapes here are
//! serializable so obstacle sets can be stored alongside voxel files.

pub mod base;
pub mod box_collider;
pub mod capsule_collider;
pub mod composite_collider;
pub mod cylinder_collider;
pub mod sphere_collider;
pub mod trimesh_collider;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tilenav_common::{Heightfield, Result};

pub use base::{
    ColliderBase, SAMPLE_POLYAREA_TYPE_DOOR, SAMPLE_POLYAREA_TYPE_GRASS,
    SAMPLE_POLYAREA_TYPE_GROUND, SAMPLE_POLYAREA_TYPE_JUMP, SAMPLE_POLYAREA_TYPE_ROAD,
    SAMPLE_POLYAREA_TYPE_WATER,
};
pub use box_collider::BoxCollider;
pub use capsule_collider::CapsuleCollider;
pub use composite_collider::CompositeCollider;
pub use cylinder_collider::CylinderCollider;
pub use sphere_collider::SphereCollider;
pub use trimesh_collider::TrimeshCollider;

/// An obstacle that can be rasterized into a tile heightfield
pub trait Collider: Debug + Send + Sync {
    /// World-space AABB as `(min, max)`
    fn bounds(&self) -> (Vec3, Vec3);

    /// Adds the collider's solid volume to `heightfield` as spans.
    ///
    /// Parts of the collider outside the heightfield's bounds are ignored.
    fn rasterize(&self, heightfield: &mut Heightfield) -> Result<()>;
}

/// Serializable collider data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerializableCollider {
    Box(BoxCollider),
    Sphere(SphereCollider),
    Capsule(CapsuleCollider),
    Cylinder(CylinderCollider),
    Trimesh(TrimeshCollider),
    Composite(CompositeCollider),
}

impl SerializableCollider {
    /// Borrow the concrete shape as a collider
    pub fn as_collider(&self) -> &dyn Collider {
        match self {
            SerializableCollider::Box(c) => c,
            SerializableCollider::Sphere(c) => c,
            SerializableCollider::Capsule(c) => c,
            SerializableCollider::Cylinder(c) => c,
            SerializableCollider::Trimesh(c) => c,
            SerializableCollider::Composite(c) => c,
        }
    }

    /// Convert to a shared collider ready to hand to the navmesh
    pub fn into_collider(self) -> Arc<dyn Collider> {
        match self {
            SerializableCollider::Box(c) => Arc::new(c),
            SerializableCollider::Sphere(c) => Arc::new(c),
            SerializableCollider::Capsule(c) => Arc::new(c),
            SerializableCollider::Cylinder(c) => Arc::new(c),
            SerializableCollider::Trimesh(c) => Arc::new(c),
            SerializableCollider::Composite(c) => Arc::new(c),
        }
    }
}

macro_rules! impl_from_shape {
    ($($shape:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$shape> for SerializableCollider {
                fn from(shape: $shape) -> Self {
                    SerializableCollider::$variant(shape)
                }
            }
        )*
    };
}

impl_from_shape!(
    BoxCollider => Box,
    SphereCollider => Sphere,
    CapsuleCollider => Capsule,
    CylinderCollider => Cylinder,
    TrimeshCollider => Trimesh,
    CompositeCollider => Composite,
);

/// Utility functions for collider operations
pub mod utils {
    use glam::Vec3;

    /// Inclusive overlap test between two AABBs on the XZ plane
    pub fn overlap_xz(min1: Vec3, max1: Vec3, min2: Vec3, max2: Vec3) -> bool {
        min1.x <= max2.x && max1.x >= min2.x && min1.z <= max2.z && max1.z >= min2.z
    }

    /// Inclusive overlap test between two AABBs
    pub fn overlap_aabb(min1: Vec3, max1: Vec3, min2: Vec3, max2: Vec3) -> bool {
        overlap_xz(min1, max1, min2, max2) && min1.y <= max2.y && max1.y >= min2.y
    }

    /// Smallest AABB containing every point
    pub fn points_bounds(points: &[Vec3]) -> (Vec3, Vec3) {
        match points.split_first() {
            None => (Vec3::ZERO, Vec3::ZERO),
            Some((first, rest)) => rest
                .iter()
                .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap() {
        let min = Vec3::ZERO;
        let max = Vec3::splat(10.0);

        assert!(utils::overlap_aabb(min, max, Vec3::splat(5.0), Vec3::splat(15.0)));
        // Touching faces count as overlap
        assert!(utils::overlap_xz(min, max, Vec3::new(10.0, 50.0, 0.0), Vec3::splat(20.0)));
        assert!(!utils::overlap_aabb(min, max, Vec3::new(0.0, 11.0, 0.0), Vec3::splat(20.0)));
        assert!(!utils::overlap_xz(min, max, Vec3::new(10.5, 0.0, 0.0), Vec3::splat(20.0)));
    }

    #[test]
    fn test_points_bounds() {
        let (min, max) = utils::points_bounds(&[
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-1.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 5.0),
        ]);
        assert_eq!(min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 4.0, 5.0));
    }

    #[test]
    fn test_serializable_collider_json() {
        let composite = CompositeCollider::new(vec![
            SphereCollider::new(Vec3::new(1.0, 2.0, 3.0), 0.5, SAMPLE_POLYAREA_TYPE_GROUND, 1.0)
                .into(),
            BoxCollider::new(Vec3::ZERO, Vec3::ONE, SAMPLE_POLYAREA_TYPE_DOOR, 0.5).into(),
        ]);
        let original = SerializableCollider::from(composite);

        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("\"type\":\"composite\""));
        let back: SerializableCollider = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);

        let collider = back.into_collider();
        let (min, max) = collider.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.5, 2.5, 3.5));
    }
}
