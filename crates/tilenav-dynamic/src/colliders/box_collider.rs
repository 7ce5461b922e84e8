//! Box collider

use super::{base::ColliderBase, Collider};
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use tilenav_common::{Heightfield, Result};

/// A box-shaped collider with arbitrary orientation
///
/// The box is defined by a center point, half-extents along its local axes,
/// and a rotation matrix taking local axes to world axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    pub base: ColliderBase,
    /// Center of the box in world coordinates
    pub center: Vec3,
    /// Half-extents of the box along its local axes
    pub half_extents: Vec3,
    /// Rotation matrix for box orientation
    pub rotation: Mat3,
}

impl BoxCollider {
    /// Create an axis-aligned box
    pub fn new(center: Vec3, half_extents: Vec3, area: u8, flag_merge_threshold: f32) -> Self {
        Self::new_oriented(center, half_extents, Mat3::IDENTITY, area, flag_merge_threshold)
    }

    /// Create an oriented box
    pub fn new_oriented(
        center: Vec3,
        half_extents: Vec3,
        rotation: Mat3,
        area: u8,
        flag_merge_threshold: f32,
    ) -> Self {
        Self {
            base: ColliderBase::new(area, flag_merge_threshold),
            center,
            half_extents: half_extents.abs(),
            rotation,
        }
    }

    /// Create an axis-aligned box from its corners
    pub fn from_min_max(min: Vec3, max: Vec3, area: u8, flag_merge_threshold: f32) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5, area, flag_merge_threshold)
    }

    /// Vertical interval of the column through `(px, pz)` inside the box
    fn column_extent(&self, px: f32, pz: f32) -> Option<(f32, f32)> {
        // Work in box space: the column becomes the line o + t*d with t = world y
        let inv = self.rotation.transpose();
        let o = inv * (Vec3::new(px, 0.0, pz) - self.center);
        let d = inv * Vec3::Y;

        let mut t0 = f32::NEG_INFINITY;
        let mut t1 = f32::INFINITY;
        for axis in 0..3 {
            let (oa, da, h) = (o[axis], d[axis], self.half_extents[axis]);
            if da.abs() < 1e-6 {
                if oa < -h || oa > h {
                    return None;
                }
                continue;
            }
            let s0 = (-h - oa) / da;
            let s1 = (h - oa) / da;
            t0 = t0.max(s0.min(s1));
            t1 = t1.min(s0.max(s1));
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

impl Collider for BoxCollider {
    fn bounds(&self) -> (Vec3, Vec3) {
        let m = self.rotation;
        let extent = Vec3::new(
            m.row(0).abs().dot(self.half_extents),
            m.row(1).abs().dot(self.half_extents),
            m.row(2).abs().dot(self.half_extents),
        );
        (self.center - extent, self.center + extent)
    }

    fn rasterize(&self, heightfield: &mut Heightfield) -> Result<()> {
        self.base
            .rasterize_columns(heightfield, self.bounds(), |px, pz| self.column_extent(px, pz))
    }
}
