use crate::io::{VoxelFile, VoxelTile};
use crate::mesh::MAX_VERTS_PER_POLY;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tilenav_common::{Error, Result};

/// Region partitioning used by the mesh pipeline
pub const PARTITION_WATERSHED: i32 = 0;
pub const PARTITION_MONOTONE: i32 = 1;
pub const PARTITION_LAYERS: i32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicNavMeshConfig {
    pub use_tiles: bool,
    pub tile_size_x: i32,
    pub tile_size_z: i32,
    pub cell_size: f32,
    pub cell_height: f32,
    pub world_min: Vec3,
    pub world_max: Vec3,
    pub partition: i32,
    pub walkable_area: u8,
    pub walkable_height: f32,
    pub walkable_slope_angle: f32,
    pub walkable_radius: f32,
    pub walkable_climb: f32,
    pub min_region_area: f32,
    pub region_merge_area: f32,
    pub max_edge_len: f32,
    pub max_simplification_error: f32,
    pub verts_per_poly: i32,
    pub build_detail_mesh: bool,
    pub detail_sample_distance: f32,
    pub detail_sample_max_error: f32,
    pub filter_low_hanging_obstacles: bool,
    pub filter_ledge_spans: bool,
    pub filter_walkable_low_height_spans: bool,
    pub enable_checkpoints: bool,
    pub keep_intermediate_results: bool,
}

impl DynamicNavMeshConfig {
    pub fn new(use_tiles: bool, tile_size_x: i32, tile_size_z: i32, cell_size: f32) -> Self {
        DynamicNavMeshConfig {
            use_tiles,
            tile_size_x,
            tile_size_z,
            cell_size,
            cell_height: 0.2,
            world_min: Vec3::new(-10.0, -5.0, -10.0),
            world_max: Vec3::new(10.0, 5.0, 10.0),
            partition: PARTITION_WATERSHED,
            walkable_area: 63,
            walkable_height: 2.0,
            walkable_slope_angle: 45.0,
            walkable_radius: 0.6,
            walkable_climb: 0.9,
            min_region_area: 8.0,
            region_merge_area: 20.0,
            max_edge_len: 12.0,
            max_simplification_error: 1.3,
            verts_per_poly: 6,
            build_detail_mesh: true,
            detail_sample_distance: 6.0,
            detail_sample_max_error: 1.0,
            filter_low_hanging_obstacles: true,
            filter_ledge_spans: true,
            filter_walkable_low_height_spans: true,
            enable_checkpoints: true,
            keep_intermediate_results: false,
        }
    }

    /// Build parameters stored in a voxel file.
    ///
    /// Cell height is per tile in the file format, so it is taken from the
    /// first tile when there is one.
    pub fn from_voxel_file(file: &VoxelFile) -> Self {
        let mut config = Self::new(file.use_tiles, file.tile_size_x, file.tile_size_z, file.cell_size)
            .with_walkable_height(file.walkable_height)
            .with_walkable_radius(file.walkable_radius)
            .with_walkable_climb(file.walkable_climb)
            .with_walkable_slope_angle(file.walkable_slope_angle)
            .with_max_simplification_error(file.max_simplification_error)
            .with_max_edge_len(file.max_edge_len)
            .with_min_region_area(file.min_region_area)
            .with_region_merge_area(file.region_merge_area)
            .with_verts_per_poly(file.verts_per_poly)
            .with_detail_mesh(file.build_mesh_detail)
            .with_detail_sample_distance(file.detail_sample_distance)
            .with_detail_sample_max_error(file.detail_sample_max_error)
            .with_world_bounds(file.bounds_min(), file.bounds_max());
        if let Some(tile) = file.tiles.first() {
            config.cell_height = tile.cell_height;
        }
        config
    }

    pub fn with_walkable_height(mut self, walkable_height: f32) -> Self {
        self.walkable_height = walkable_height;
        self
    }

    pub fn with_walkable_radius(mut self, walkable_radius: f32) -> Self {
        self.walkable_radius = walkable_radius;
        self
    }

    pub fn with_walkable_climb(mut self, walkable_climb: f32) -> Self {
        self.walkable_climb = walkable_climb;
        self
    }

    pub fn with_walkable_slope_angle(mut self, walkable_slope_angle: f32) -> Self {
        self.walkable_slope_angle = walkable_slope_angle;
        self
    }

    pub fn with_min_region_area(mut self, min_region_area: f32) -> Self {
        self.min_region_area = min_region_area;
        self
    }

    pub fn with_region_merge_area(mut self, region_merge_area: f32) -> Self {
        self.region_merge_area = region_merge_area;
        self
    }

    pub fn with_max_edge_len(mut self, max_edge_len: f32) -> Self {
        self.max_edge_len = max_edge_len;
        self
    }

    pub fn with_max_simplification_error(mut self, max_simplification_error: f32) -> Self {
        self.max_simplification_error = max_simplification_error;
        self
    }

    pub fn with_verts_per_poly(mut self, verts_per_poly: i32) -> Self {
        self.verts_per_poly = verts_per_poly;
        self
    }

    pub fn with_detail_mesh(mut self, build_detail_mesh: bool) -> Self {
        self.build_detail_mesh = build_detail_mesh;
        self
    }

    pub fn with_detail_sample_distance(mut self, detail_sample_distance: f32) -> Self {
        self.detail_sample_distance = detail_sample_distance;
        self
    }

    pub fn with_detail_sample_max_error(mut self, detail_sample_max_error: f32) -> Self {
        self.detail_sample_max_error = detail_sample_max_error;
        self
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_checkpoints(mut self, enable_checkpoints: bool) -> Self {
        self.enable_checkpoints = enable_checkpoints;
        self
    }

    pub fn with_keep_intermediate_results(mut self, keep_intermediate_results: bool) -> Self {
        self.keep_intermediate_results = keep_intermediate_results;
        self
    }

    pub fn with_world_bounds(mut self, world_min: Vec3, world_max: Vec3) -> Self {
        self.world_min = world_min;
        self.world_max = world_max;
        self
    }

    pub fn with_cell_height(mut self, cell_height: f32) -> Self {
        self.cell_height = cell_height;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));
        if self.cell_size <= 0.0 {
            return fail("cell size must be positive");
        }
        if self.cell_height <= 0.0 {
            return fail("cell height must be positive");
        }
        if self.use_tiles && (self.tile_size_x <= 0 || self.tile_size_z <= 0) {
            return fail("tile size must be positive when tiling is enabled");
        }
        if self.walkable_height <= 0.0 {
            return fail("walkable height must be positive");
        }
        if self.walkable_radius < 0.0 {
            return fail("walkable radius cannot be negative");
        }
        if self.walkable_climb < 0.0 {
            return fail("walkable climb cannot be negative");
        }
        if self.verts_per_poly < 3 {
            return fail("polygons need at least 3 vertices");
        }
        if !(PARTITION_WATERSHED..=PARTITION_LAYERS).contains(&self.partition) {
            return fail("unknown partition type");
        }
        if self.world_min.x >= self.world_max.x
            || self.world_min.y > self.world_max.y
            || self.world_min.z >= self.world_max.z
        {
            return fail("world bounds invalid: min must be less than max");
        }
        Ok(())
    }
}

impl Default for DynamicNavMeshConfig {
    fn default() -> Self {
        Self::new(true, 32, 32, 0.3)
    }
}

/// Parameters handed to the mesh pipeline for one tile
///
/// World distances from [`DynamicNavMeshConfig`] are converted to voxel units
/// using the tile's own cell metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct TileBuildConfig {
    pub tile_x: i32,
    pub tile_z: i32,
    pub width: i32,
    pub height: i32,
    pub border_size: i32,
    pub cs: f32,
    pub ch: f32,
    pub bmin: Vec3,
    pub bmax: Vec3,
    pub partition: i32,
    pub walkable_area: u8,
    pub walkable_slope_angle: f32,
    /// Agent dimensions in world units
    pub walkable_height_world: f32,
    pub walkable_radius_world: f32,
    pub walkable_climb_world: f32,
    /// Agent dimensions in voxels
    pub walkable_height: i32,
    pub walkable_radius: i32,
    pub walkable_climb: i32,
    pub min_region_area: i32,
    pub merge_region_area: i32,
    pub max_edge_len: i32,
    pub max_simplification_error: f32,
    pub verts_per_poly: i32,
    pub build_detail_mesh: bool,
    pub detail_sample_dist: f32,
    pub detail_sample_max_error: f32,
    pub filter_low_hanging_obstacles: bool,
    pub filter_ledge_spans: bool,
    pub filter_walkable_low_height_spans: bool,
}

impl TileBuildConfig {
    pub fn new(config: &DynamicNavMeshConfig, tile: &VoxelTile) -> Self {
        let cs = tile.cell_size;
        let ch = tile.cell_height;
        Self {
            tile_x: tile.tile_x,
            tile_z: tile.tile_z,
            width: tile.width,
            height: tile.depth,
            border_size: tile.border_size,
            cs,
            ch,
            bmin: tile.bounds_min,
            bmax: tile.bounds_max,
            partition: config.partition,
            walkable_area: config.walkable_area,
            walkable_slope_angle: config.walkable_slope_angle,
            walkable_height_world: config.walkable_height,
            walkable_radius_world: config.walkable_radius,
            walkable_climb_world: config.walkable_climb,
            walkable_height: (config.walkable_height / ch).ceil() as i32,
            walkable_radius: (config.walkable_radius / cs).ceil() as i32,
            walkable_climb: (config.walkable_climb / ch).floor() as i32,
            min_region_area: config.min_region_area as i32,
            merge_region_area: config.region_merge_area as i32,
            max_edge_len: (config.max_edge_len / cs) as i32,
            max_simplification_error: config.max_simplification_error,
            verts_per_poly: config.verts_per_poly.clamp(3, MAX_VERTS_PER_POLY),
            build_detail_mesh: config.build_detail_mesh,
            detail_sample_dist: if config.detail_sample_distance < 0.9 {
                0.0
            } else {
                cs * config.detail_sample_distance
            },
            detail_sample_max_error: ch * config.detail_sample_max_error,
            filter_low_hanging_obstacles: config.filter_low_hanging_obstacles,
            filter_ledge_spans: config.filter_ledge_spans,
            filter_walkable_low_height_spans: config.filter_walkable_low_height_spans,
        }
    }
}
