use glam::Vec3;
use std::sync::Arc;
use tilenav_common::Heightfield;

/// Result of a voxel raycast operation
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelRaycastHit {
    /// Fraction along `start..end` where the ray first enters solid voxels
    pub t: f32,
    /// The world position of the hit
    pub position: Vec3,
    /// Tile containing the hit
    pub tile_x: i32,
    pub tile_z: i32,
    /// Heightfield cell containing the hit
    pub cell_x: i32,
    pub cell_z: i32,
}

/// Looks up the heightfield of a tile by tile coordinate
pub type HeightfieldProvider<'a> = Box<dyn Fn(i32, i32) -> Option<Arc<Heightfield>> + Send + Sync + 'a>;

/// Voxel raycast system using the Fast Voxel Traversal Algorithm
///
/// Based on "A Fast Voxel Traversal Algorithm for Ray Tracing"
/// by John Amanatides and Andrew Woo. The ray is walked over the tile grid
/// first, then over the cells of every tile that has a heightfield.
pub struct VoxelQuery<'a> {
    /// Origin point of the tile grid
    origin: Vec3,
    tile_width: f32,
    tile_depth: f32,
    heightfield_provider: HeightfieldProvider<'a>,
}

impl<'a> VoxelQuery<'a> {
    pub fn new(
        origin: Vec3,
        tile_width: f32,
        tile_depth: f32,
        heightfield_provider: HeightfieldProvider<'a>,
    ) -> Self {
        VoxelQuery {
            origin,
            tile_width,
            tile_depth,
            heightfield_provider,
        }
    }

    /// Casts the segment `start..end` against the solid voxels.
    ///
    /// Tiles without a heightfield are skipped. Returns the first hit.
    pub fn raycast(&self, start: Vec3, end: Vec3) -> Option<VoxelRaycastHit> {
        let dir = end - start;
        let tiles = GridWalk::new(
            self.origin,
            self.tile_width,
            self.tile_depth,
            start,
            dir,
            0.0,
            1.0,
        );
        for step in tiles {
            let Some(heightfield) = (self.heightfield_provider)(step.x, step.z) else {
                continue;
            };
            if let Some((t, cell_x, cell_z)) =
                traverse_heightfield(&heightfield, start, dir, step.t_enter, step.t_exit)
            {
                return Some(VoxelRaycastHit {
                    t,
                    position: start + dir * t,
                    tile_x: step.x,
                    tile_z: step.z,
                    cell_x,
                    cell_z,
                });
            }
        }
        None
    }

    /// Casts `start..end` against a single heightfield, returning the hit fraction
    pub fn raycast_heightfield(heightfield: &Heightfield, start: Vec3, end: Vec3) -> Option<f32> {
        traverse_heightfield(heightfield, start, end - start, 0.0, 1.0).map(|(t, _, _)| t)
    }
}

/// One grid cell crossed by a ray, with the ray parameters at which the
/// ray enters and leaves it
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridStep {
    x: i32,
    z: i32,
    t_enter: f32,
    t_exit: f32,
}

/// Amanatides-Woo walk over an XZ grid for the ray `start + t * dir` with
/// `t` in `[t_start, t_end]`
struct GridWalk {
    x: i32,
    z: i32,
    end_x: i32,
    end_z: i32,
    step_x: i32,
    step_z: i32,
    t_max_x: f32,
    t_max_z: f32,
    t_delta_x: f32,
    t_delta_z: f32,
    t: f32,
    t_end: f32,
    done: bool,
}

impl GridWalk {
    fn new(
        origin: Vec3,
        cell_w: f32,
        cell_d: f32,
        start: Vec3,
        dir: Vec3,
        t_start: f32,
        t_end: f32,
    ) -> Self {
        let p0 = start + dir * t_start;
        let p1 = start + dir * t_end;
        let x = ((p0.x - origin.x) / cell_w).floor() as i32;
        let z = ((p0.z - origin.z) / cell_d).floor() as i32;
        let end_x = ((p1.x - origin.x) / cell_w).floor() as i32;
        let end_z = ((p1.z - origin.z) / cell_d).floor() as i32;

        let (step_x, t_max_x, t_delta_x) = axis_setup(origin.x, cell_w, start.x, dir.x, x);
        let (step_z, t_max_z, t_delta_z) = axis_setup(origin.z, cell_d, start.z, dir.z, z);

        GridWalk {
            x,
            z,
            end_x,
            end_z,
            step_x,
            step_z,
            t_max_x,
            t_max_z,
            t_delta_x,
            t_delta_z,
            t: t_start,
            t_end,
            done: t_start > t_end,
        }
    }
}

/// Step direction, first boundary crossing and crossing interval along one axis
fn axis_setup(origin: f32, cell: f32, start: f32, dir: f32, index: i32) -> (i32, f32, f32) {
    if dir > 0.0 {
        let boundary = origin + (index + 1) as f32 * cell;
        (1, (boundary - start) / dir, cell / dir)
    } else if dir < 0.0 {
        let boundary = origin + index as f32 * cell;
        (-1, (boundary - start) / dir, -cell / dir)
    } else {
        (0, f32::INFINITY, f32::INFINITY)
    }
}

impl Iterator for GridWalk {
    type Item = GridStep;

    fn next(&mut self) -> Option<GridStep> {
        if self.done {
            return None;
        }
        let t_exit = self.t_max_x.min(self.t_max_z).min(self.t_end);
        let step = GridStep {
            x: self.x,
            z: self.z,
            t_enter: self.t,
            t_exit,
        };

        if (self.x == self.end_x && self.z == self.end_z) || t_exit >= self.t_end {
            self.done = true;
        } else if self.t_max_x < self.t_max_z {
            self.x += self.step_x;
            self.t = self.t_max_x;
            self.t_max_x += self.t_delta_x;
        } else {
            self.z += self.step_z;
            self.t = self.t_max_z;
            self.t_max_z += self.t_delta_z;
        }
        Some(step)
    }
}

/// First hit of the ray against `heightfield` within `[t_start, t_end]`,
/// as `(t, cell_x, cell_z)`
fn traverse_heightfield(
    heightfield: &Heightfield,
    start: Vec3,
    dir: Vec3,
    t_start: f32,
    t_end: f32,
) -> Option<(f32, i32, i32)> {
    let cells = GridWalk::new(
        heightfield.bmin,
        heightfield.cs,
        heightfield.cs,
        start,
        dir,
        t_start,
        t_end,
    );
    for step in cells {
        let Some(column) = heightfield.column(step.x, step.z) else {
            continue;
        };
        let y_enter = start.y + dir.y * step.t_enter;
        let y_exit = start.y + dir.y * step.t_exit;
        let (y_lo, y_hi) = (y_enter.min(y_exit), y_enter.max(y_exit));

        let mut best: Option<f32> = None;
        for span in column {
            let (span_min, span_max) = heightfield.span_world_extent(span);
            if y_hi < span_min || y_lo > span_max {
                continue;
            }
            let t = if y_enter > span_max {
                (span_max - start.y) / dir.y
            } else if y_enter < span_min {
                (span_min - start.y) / dir.y
            } else {
                step.t_enter
            };
            let t = t.clamp(step.t_enter, step.t_exit);
            best = Some(best.map_or(t, |b| b.min(t)));
        }
        if let Some(t) = best {
            return Some((t, step.x, step.z));
        }
    }
    None
}
