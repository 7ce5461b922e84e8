use super::{ByteOrder, VoxelFileReader, VoxelFileWriter, VoxelTile};
use crate::config::DynamicNavMeshConfig;
use glam::Vec3;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tilenav_common::Result;

pub const VOXEL_FILE_MAGIC: u32 =
    (b'V' as u32) << 24 | (b'O' as u32) << 16 | (b'X' as u32) << 8 | (b'L' as u32);
pub const VERSION_EXPORTER_MASK: u32 = 0xF000;
pub const VERSION_COMPRESSION_MASK: u32 = 0x0F00;
/// Files written by the legacy exporter carry no exporter bits
pub const VERSION_EXPORTER_LEGACY: u32 = 0x0000;
pub const VERSION_EXPORTER_NATIVE: u32 = 0x1000;
pub const VERSION_COMPRESSION_NONE: u32 = 0x0000;
pub const VERSION_COMPRESSION_LZ4: u32 = 0x0100;

/// Build parameters and per-tile heightfields of a navmesh
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelFile {
    pub version: u32,
    pub walkable_radius: f32,
    pub walkable_height: f32,
    pub walkable_climb: f32,
    pub walkable_slope_angle: f32,
    pub cell_size: f32,
    pub max_simplification_error: f32,
    pub max_edge_len: f32,
    pub min_region_area: f32,
    pub region_merge_area: f32,
    pub verts_per_poly: i32,
    pub build_mesh_detail: bool,
    pub detail_sample_distance: f32,
    pub detail_sample_max_error: f32,
    pub use_tiles: bool,
    pub tile_size_x: i32,
    pub tile_size_z: i32,
    pub rotation: Vec3,
    /// World bounds as `[min x, min y, min z, max x, max y, max z]`
    pub bounds: [f32; 6],
    pub tiles: Vec<VoxelTile>,
}

impl Default for VoxelFile {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelFile {
    pub fn new() -> Self {
        VoxelFile {
            version: VERSION_EXPORTER_NATIVE,
            walkable_radius: 0.0,
            walkable_height: 0.0,
            walkable_climb: 0.0,
            walkable_slope_angle: 0.0,
            cell_size: 0.0,
            max_simplification_error: 0.0,
            max_edge_len: 0.0,
            min_region_area: 0.0,
            region_merge_area: 0.0,
            verts_per_poly: 6,
            build_mesh_detail: true,
            detail_sample_distance: 0.0,
            detail_sample_max_error: 0.0,
            use_tiles: false,
            tile_size_x: 0,
            tile_size_z: 0,
            rotation: Vec3::ZERO,
            bounds: [0.0; 6],
            tiles: Vec::new(),
        }
    }

    /// Voxel file holding `tiles` with build parameters taken from `config`.
    ///
    /// World bounds are the union of the tile bounds, or the configured world
    /// bounds when there are no tiles.
    pub fn from_tiles(config: &DynamicNavMeshConfig, tiles: Vec<VoxelTile>) -> Self {
        let (min, max) = tiles
            .iter()
            .map(|t| (t.bounds_min, t.bounds_max))
            .reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
            .unwrap_or((config.world_min, config.world_max));

        VoxelFile {
            version: VERSION_EXPORTER_NATIVE,
            walkable_radius: config.walkable_radius,
            walkable_height: config.walkable_height,
            walkable_climb: config.walkable_climb,
            walkable_slope_angle: config.walkable_slope_angle,
            cell_size: config.cell_size,
            max_simplification_error: config.max_simplification_error,
            max_edge_len: config.max_edge_len,
            min_region_area: config.min_region_area,
            region_merge_area: config.region_merge_area,
            verts_per_poly: config.verts_per_poly,
            build_mesh_detail: config.build_detail_mesh,
            detail_sample_distance: config.detail_sample_distance,
            detail_sample_max_error: config.detail_sample_max_error,
            use_tiles: config.use_tiles,
            tile_size_x: config.tile_size_x,
            tile_size_z: config.tile_size_z,
            rotation: Vec3::ZERO,
            bounds: [min.x, min.y, min.z, max.x, max.y, max.z],
            tiles,
        }
    }

    pub fn add_tile(&mut self, tile: VoxelTile) {
        self.tiles.push(tile);
    }

    pub fn bounds_min(&self) -> Vec3 {
        Vec3::new(self.bounds[0], self.bounds[1], self.bounds[2])
    }

    pub fn bounds_max(&self) -> Vec3 {
        Vec3::new(self.bounds[3], self.bounds[4], self.bounds[5])
    }

    pub fn is_compressed(&self) -> bool {
        self.version & VERSION_COMPRESSION_MASK == VERSION_COMPRESSION_LZ4
    }

    pub fn is_legacy(&self) -> bool {
        self.version & VERSION_EXPORTER_MASK == VERSION_EXPORTER_LEGACY
    }

    /// Reads a voxel file from disk with the default LZ4 codec
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        VoxelFileReader::new().read(BufReader::new(file))
    }

    /// Writes a native-format voxel file to disk with the default LZ4 codec
    pub fn save(&self, path: impl AsRef<Path>, byte_order: ByteOrder, compression: bool) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        VoxelFileWriter::new().write(&mut out, self, byte_order, compression, false)?;
        out.flush()?;
        Ok(())
    }
}
