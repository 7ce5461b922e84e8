//! Triangle mesh collider

use super::{base::ColliderBase, utils, Collider};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tilenav_common::{Error, Heightfield, Result, SPAN_MAX_HEIGHT};

/// Arbitrary triangle soup rasterized surface-only
///
/// Unlike the volume shapes, each triangle only contributes the vertical
/// range it covers inside a cell, so a flat mesh produces thin spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimeshCollider {
    pub base: ColliderBase,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TrimeshCollider {
    pub fn new(
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        area: u8,
        flag_merge_threshold: f32,
    ) -> Self {
        Self {
            base: ColliderBase::new(area, flag_merge_threshold),
            vertices,
            triangles,
        }
    }

    fn triangle(&self, index: usize) -> Result<[Vec3; 3]> {
        let tri = self.triangles[index];
        let mut out = [Vec3::ZERO; 3];
        for (slot, &vi) in out.iter_mut().zip(tri.iter()) {
            *slot = *self.vertices.get(vi as usize).ok_or_else(|| {
                Error::Heightfield(format!(
                    "triangle {} references vertex {} of {}",
                    index,
                    vi,
                    self.vertices.len()
                ))
            })?;
        }
        Ok(out)
    }
}

/// Keeps the part of a convex polygon on one side of an axis-aligned plane
fn clip_polygon(poly: &[Vec3], axis: usize, line: f32, keep_above: bool) -> Vec<Vec3> {
    let side = |v: &Vec3| if keep_above { v[axis] - line } else { line - v[axis] };
    let mut out = Vec::with_capacity(poly.len() + 2);
    for (i, cur) in poly.iter().enumerate() {
        let prev = &poly[(i + poly.len() - 1) % poly.len()];
        let (dp, dc) = (side(prev), side(cur));
        if (dp >= 0.0) != (dc >= 0.0) {
            let s = dp / (dp - dc);
            out.push(*prev + (*cur - *prev) * s);
        }
        if dc >= 0.0 {
            out.push(*cur);
        }
    }
    out
}

fn rasterize_triangle(
    heightfield: &mut Heightfield,
    verts: [Vec3; 3],
    area: u8,
    merge: i32,
) -> Result<()> {
    const EPS: f32 = 1e-6;

    let (tmin, tmax) = utils::points_bounds(&verts);
    if !utils::overlap_aabb(tmin, tmax, heightfield.bmin, heightfield.bmax) {
        return Ok(());
    }

    let cs = heightfield.cs;
    let ch = heightfield.ch;
    let origin = heightfield.bmin;
    let top = heightfield.bmax.y - origin.y;
    let z0 = (((tmin.z - origin.z) / cs).floor() as i32).clamp(0, heightfield.height - 1);
    let z1 = (((tmax.z - origin.z) / cs).floor() as i32).clamp(0, heightfield.height - 1);

    for z in z0..=z1 {
        let cz = origin.z + z as f32 * cs;
        let row = clip_polygon(&verts, 2, cz, true);
        let row = clip_polygon(&row, 2, cz + cs, false);
        if row.len() < 3 {
            continue;
        }
        let (rmin, rmax) = utils::points_bounds(&row);
        // Triangle only touches the row boundary
        if rmax.z - rmin.z <= EPS && tmax.z - tmin.z > EPS {
            continue;
        }

        let x0 = (((rmin.x - origin.x) / cs).floor() as i32).clamp(0, heightfield.width - 1);
        let x1 = (((rmax.x - origin.x) / cs).floor() as i32).clamp(0, heightfield.width - 1);
        for x in x0..=x1 {
            let cx = origin.x + x as f32 * cs;
            let cell = clip_polygon(&row, 0, cx, true);
            let cell = clip_polygon(&cell, 0, cx + cs, false);
            if cell.len() < 3 {
                continue;
            }
            let (cmin, cmax) = utils::points_bounds(&cell);
            if cmax.x - cmin.x <= EPS && rmax.x - rmin.x > EPS {
                continue;
            }

            let lo = cmin.y - origin.y;
            let hi = cmax.y - origin.y;
            if hi < 0.0 || lo > top {
                continue;
            }
            let smin = ((lo.max(0.0) / ch).floor() as i32).clamp(0, SPAN_MAX_HEIGHT - 1);
            let smax = ((hi.min(top) / ch).ceil() as i32).clamp(smin + 1, SPAN_MAX_HEIGHT);
            heightfield.add_span(x, z, smin, smax, area, merge)?;
        }
    }
    Ok(())
}

impl Collider for TrimeshCollider {
    fn bounds(&self) -> (Vec3, Vec3) {
        utils::points_bounds(&self.vertices)
    }

    fn rasterize(&self, heightfield: &mut Heightfield) -> Result<()> {
        if heightfield.width <= 0 || heightfield.height <= 0 {
            return Ok(());
        }
        let merge = self.base.merge_threshold_cells(heightfield.ch);
        for i in 0..self.triangles.len() {
            let verts = self.triangle(i)?;
            rasterize_triangle(heightfield, verts, self.base.area, merge)?;
        }
        Ok(())
    }
}
