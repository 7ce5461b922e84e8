//! Capsule collider

use super::{
    base::{cylinder_column, merge_columns, sphere_column, ColliderBase},
    Collider,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tilenav_common::{Heightfield, Result};

/// A segment swept by a sphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleCollider {
    pub base: ColliderBase,
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl CapsuleCollider {
    pub fn new(start: Vec3, end: Vec3, radius: f32, area: u8, flag_merge_threshold: f32) -> Self {
        Self {
            base: ColliderBase::new(area, flag_merge_threshold),
            start,
            end,
            radius: radius.abs(),
        }
    }

    fn column_extent(&self, px: f32, pz: f32) -> Option<(f32, f32)> {
        let caps = merge_columns(
            sphere_column(self.start, self.radius, px, pz),
            sphere_column(self.end, self.radius, px, pz),
        );
        merge_columns(
            caps,
            cylinder_column(self.start, self.end, self.radius, px, pz),
        )
    }
}

impl Collider for CapsuleCollider {
    fn bounds(&self) -> (Vec3, Vec3) {
        let r = Vec3::splat(self.radius);
        (
            self.start.min(self.end) - r,
            self.start.max(self.end) + r,
        )
    }

    fn rasterize(&self, heightfield: &mut Heightfield) -> Result<()> {
        self.base
            .rasterize_columns(heightfield, self.bounds(), |px, pz| self.column_extent(px, pz))
    }
}
