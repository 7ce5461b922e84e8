//! Shared collider data and column rasterization

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tilenav_common::{Heightfield, Result, SPAN_MAX_HEIGHT};

use super::utils;

/// Area type for walkable ground
pub const SAMPLE_POLYAREA_TYPE_GROUND: u8 = 0;
/// Area type for water surfaces
pub const SAMPLE_POLYAREA_TYPE_WATER: u8 = 1;
/// Area type for roads
pub const SAMPLE_POLYAREA_TYPE_ROAD: u8 = 2;
/// Area type for doors
pub const SAMPLE_POLYAREA_TYPE_DOOR: u8 = 3;
/// Area type for grass
pub const SAMPLE_POLYAREA_TYPE_GRASS: u8 = 4;
/// Area type for jump links
pub const SAMPLE_POLYAREA_TYPE_JUMP: u8 = 5;

/// Area id and merge behaviour common to every shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderBase {
    /// Area id written into the spans this collider produces
    pub area: u8,
    /// World-space distance under which span tops are treated as the same surface
    pub flag_merge_threshold: f32,
}

impl ColliderBase {
    pub fn new(area: u8, flag_merge_threshold: f32) -> Self {
        Self {
            area,
            flag_merge_threshold,
        }
    }

    /// Merge threshold in cell-height units for a given heightfield
    pub fn merge_threshold_cells(&self, ch: f32) -> i32 {
        (self.flag_merge_threshold / ch).floor() as i32
    }

    /// Rasterizes a shape column by column.
    ///
    /// `extent` receives the world XZ position of a cell center and returns
    /// the shape's vertical interval along that column, if it has one. Cells
    /// outside `bounds` are never sampled.
    pub fn rasterize_columns<F>(
        &self,
        heightfield: &mut Heightfield,
        bounds: (Vec3, Vec3),
        mut extent: F,
    ) -> Result<()>
    where
        F: FnMut(f32, f32) -> Option<(f32, f32)>,
    {
        let (min, max) = bounds;
        if !utils::overlap_aabb(min, max, heightfield.bmin, heightfield.bmax) {
            return Ok(());
        }
        if heightfield.width <= 0 || heightfield.height <= 0 {
            return Ok(());
        }

        let cs = heightfield.cs;
        let ch = heightfield.ch;
        let origin = heightfield.bmin;
        let x0 = (((min.x - origin.x) / cs).floor() as i32).clamp(0, heightfield.width - 1);
        let x1 = (((max.x - origin.x) / cs).floor() as i32).clamp(0, heightfield.width - 1);
        let z0 = (((min.z - origin.z) / cs).floor() as i32).clamp(0, heightfield.height - 1);
        let z1 = (((max.z - origin.z) / cs).floor() as i32).clamp(0, heightfield.height - 1);
        let top = heightfield.bmax.y - origin.y;
        let merge = self.merge_threshold_cells(ch);

        for z in z0..=z1 {
            for x in x0..=x1 {
                let px = origin.x + (x as f32 + 0.5) * cs;
                let pz = origin.z + (z as f32 + 0.5) * cs;
                let Some((ymin, ymax)) = extent(px, pz) else {
                    continue;
                };
                let lo = ymin - origin.y;
                let hi = ymax - origin.y;
                if hi < 0.0 || lo > top || lo > hi {
                    continue;
                }
                let smin = ((lo / ch).floor() as i32).clamp(0, SPAN_MAX_HEIGHT - 1);
                let smax = ((hi / ch).ceil() as i32).clamp(smin + 1, SPAN_MAX_HEIGHT);
                heightfield.add_span(x, z, smin, smax, self.area, merge)?;
            }
        }
        Ok(())
    }
}

impl Default for ColliderBase {
    fn default() -> Self {
        Self {
            area: SAMPLE_POLYAREA_TYPE_GROUND,
            flag_merge_threshold: 1.0,
        }
    }
}

/// Vertical interval of a sphere along the column through `(px, pz)`
pub(crate) fn sphere_column(center: Vec3, radius: f32, px: f32, pz: f32) -> Option<(f32, f32)> {
    let dx = px - center.x;
    let dz = pz - center.z;
    let d2 = dx * dx + dz * dz;
    let r2 = radius * radius;
    if d2 > r2 {
        return None;
    }
    let h = (r2 - d2).sqrt();
    Some((center.y - h, center.y + h))
}

/// Vertical interval of the column through `(px, pz)` inside the infinite
/// cylinder around `start..end`, clipped to the slab between the two cap
/// planes.
pub(crate) fn cylinder_column(
    start: Vec3,
    end: Vec3,
    radius: f32,
    px: f32,
    pz: f32,
) -> Option<(f32, f32)> {
    const EPS: f32 = 1e-6;

    let axis = end - start;
    let len = axis.length();
    if len < EPS {
        return None;
    }
    let a = axis / len;
    let d = Vec3::Y;
    let w = Vec3::new(px, 0.0, pz) - start;

    // Radial constraint: |w_perp + t d_perp|^2 <= r^2
    let d_perp = d - a * d.dot(a);
    let w_perp = w - a * w.dot(a);
    let qa = d_perp.dot(d_perp);
    let qb = 2.0 * w_perp.dot(d_perp);
    let qc = w_perp.dot(w_perp) - radius * radius;
    let (mut t0, mut t1) = if qa < EPS {
        if qc > 0.0 {
            return None;
        }
        (f32::NEG_INFINITY, f32::INFINITY)
    } else {
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        ((-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa))
    };

    // Cap slab: 0 <= (w + t d).a <= len
    let wa = w.dot(a);
    let da = d.dot(a);
    if da.abs() < EPS {
        if wa < 0.0 || wa > len {
            return None;
        }
    } else {
        let s0 = -wa / da;
        let s1 = (len - wa) / da;
        t0 = t0.max(s0.min(s1));
        t1 = t1.min(s0.max(s1));
    }

    (t0 <= t1).then_some((t0, t1))
}

/// Union of two column intervals, assuming they come from one convex shape
pub(crate) fn merge_columns(
    a: Option<(f32, f32)>,
    b: Option<(f32, f32)>,
) -> Option<(f32, f32)> {
    match (a, b) {
        (Some((a0, a1)), Some((b0, b1))) => Some((a0.min(b0), a1.max(b1))),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_column() {
        let (lo, hi) = sphere_column(Vec3::new(0.0, 5.0, 0.0), 2.0, 0.0, 0.0).unwrap();
        assert_eq!((lo, hi), (3.0, 7.0));
        assert!(sphere_column(Vec3::ZERO, 1.0, 1.5, 0.0).is_none());
    }

    #[test]
    fn test_vertical_cylinder_column() {
        let start = Vec3::new(0.0, 1.0, 0.0);
        let end = Vec3::new(0.0, 4.0, 0.0);
        let (lo, hi) = cylinder_column(start, end, 1.0, 0.5, 0.0).unwrap();
        assert!((lo - 1.0).abs() < 1e-5);
        assert!((hi - 4.0).abs() < 1e-5);
        assert!(cylinder_column(start, end, 1.0, 1.5, 0.0).is_none());
    }

    #[test]
    fn test_horizontal_cylinder_column() {
        // Axis along x at height 2, radius 1: the column through the axis
        // spans y in [1, 3]
        let start = Vec3::new(-2.0, 2.0, 0.0);
        let end = Vec3::new(2.0, 2.0, 0.0);
        let (lo, hi) = cylinder_column(start, end, 1.0, 0.0, 0.0).unwrap();
        assert!((lo - 1.0).abs() < 1e-5);
        assert!((hi - 3.0).abs() < 1e-5);
        // Beyond the caps
        assert!(cylinder_column(start, end, 1.0, 3.0, 0.0).is_none());
    }

    #[test]
    fn test_rasterize_columns_clamps_to_heightfield() {
        let mut hf = Heightfield::new(4, 4, Vec3::ZERO, Vec3::new(4.0, 4.0, 4.0), 1.0, 0.5);
        let base = ColliderBase::new(7, 0.0);
        // Only the cells whose centers fall in x,z < 2 are sampled
        base.rasterize_columns(
            &mut hf,
            (Vec3::new(-5.0, 0.0, -5.0), Vec3::new(1.5, 1.0, 1.5)),
            |px, pz| (px < 2.0 && pz < 2.0).then_some((0.2, 1.0)),
        )
        .unwrap();

        assert_eq!(hf.span_count(), 4);
        let span = hf.column(1, 1).unwrap()[0];
        assert_eq!((span.min, span.max, span.area), (0, 2, 7));
        assert!(hf.column(2, 2).unwrap().is_empty());
    }

    #[test]
    fn test_rasterize_columns_skips_disjoint_bounds() {
        let mut hf = Heightfield::new(2, 2, Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0), 1.0, 1.0);
        ColliderBase::default()
            .rasterize_columns(
                &mut hf,
                (Vec3::new(0.0, 5.0, 0.0), Vec3::new(2.0, 6.0, 2.0)),
                |_, _| Some((5.0, 6.0)),
            )
            .unwrap();
        assert!(hf.is_empty());
    }
}
