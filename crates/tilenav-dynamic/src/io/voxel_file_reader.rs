use super::byte_order::{ByteOrder, OrderedReader};
use super::{
    Lz4Compressor, VoxelCompressor, VoxelFile, VoxelTile, VERSION_COMPRESSION_LZ4,
    VERSION_COMPRESSION_MASK, VERSION_COMPRESSION_NONE, VERSION_EXPORTER_LEGACY,
    VERSION_EXPORTER_MASK, VERSION_EXPORTER_NATIVE, VOXEL_FILE_MAGIC,
};
use glam::Vec3;
use std::io::Read;
use tilenav_common::{Error, Result};

/// Size of the struct padding that closes a legacy header
pub(crate) const LEGACY_HEADER_PADDING: usize = 2;

pub struct VoxelFileReader {
    compressor: Option<Box<dyn VoxelCompressor>>,
}

impl Default for VoxelFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelFileReader {
    /// Reader that decompresses LZ4 payloads
    pub fn new() -> Self {
        Self::with_compressor(Box::new(Lz4Compressor))
    }

    pub fn with_compressor(compressor: Box<dyn VoxelCompressor>) -> Self {
        VoxelFileReader {
            compressor: Some(compressor),
        }
    }

    /// Reader that rejects compressed files
    pub fn without_compressor() -> Self {
        VoxelFileReader { compressor: None }
    }

    pub fn read<R: Read>(&self, mut reader: R) -> Result<VoxelFile> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let order = ByteOrder::detect(magic, VOXEL_FILE_MAGIC).ok_or_else(|| {
            Error::InvalidFormat(format!("bad magic {:02x?}", magic))
        })?;
        let mut reader = OrderedReader::new(reader, order);

        let mut file = VoxelFile::new();
        file.version = reader.read_u32()?;
        let legacy = match file.version & VERSION_EXPORTER_MASK {
            VERSION_EXPORTER_LEGACY => true,
            VERSION_EXPORTER_NATIVE => false,
            _ => return Err(Error::UnsupportedVersion(file.version)),
        };
        let compressed = match file.version & VERSION_COMPRESSION_MASK {
            VERSION_COMPRESSION_NONE => false,
            VERSION_COMPRESSION_LZ4 => true,
            _ => return Err(Error::UnsupportedVersion(file.version)),
        };
        let compressor = match (compressed, &self.compressor) {
            (false, _) => None,
            (true, Some(compressor)) => Some(compressor.as_ref()),
            (true, None) => {
                return Err(Error::Compression(
                    "compressed voxel file requires a compressor".to_string(),
                ))
            }
        };

        file.walkable_radius = reader.read_f32()?;
        file.walkable_height = reader.read_f32()?;
        file.walkable_climb = reader.read_f32()?;
        file.walkable_slope_angle = reader.read_f32()?;
        file.cell_size = reader.read_f32()?;
        file.max_simplification_error = reader.read_f32()?;
        file.max_edge_len = reader.read_f32()?;
        file.min_region_area = reader.read_f32()?;

        if legacy {
            file.region_merge_area = 6.0 * file.min_region_area;
            file.verts_per_poly = 6;
            file.build_mesh_detail = true;
            file.detail_sample_distance = file.max_edge_len * 0.5;
            file.detail_sample_max_error = file.max_simplification_error * 0.8;
        } else {
            file.region_merge_area = reader.read_f32()?;
            file.verts_per_poly = reader.read_i32()?;
            file.build_mesh_detail = reader.read_bool()?;
            file.detail_sample_distance = reader.read_f32()?;
            file.detail_sample_max_error = reader.read_f32()?;
        }

        file.use_tiles = reader.read_bool()?;
        file.tile_size_x = reader.read_i32()?;
        file.tile_size_z = reader.read_i32()?;
        file.rotation = read_vec3(&mut reader)?;
        for value in file.bounds.iter_mut() {
            *value = reader.read_f32()?;
        }

        if legacy {
            // Bounds are saved as center + size, convert to min + max
            for i in 0..3 {
                file.bounds[i] -= 0.5 * file.bounds[i + 3];
                file.bounds[i + 3] += file.bounds[i];
            }
            reader.skip(LEGACY_HEADER_PADDING)?;
        }

        let tile_count = reader.read_i32()?;
        if tile_count < 0 {
            return Err(Error::InvalidFormat(format!("negative tile count {}", tile_count)));
        }
        let world_min = file.bounds_min();
        for _ in 0..tile_count {
            let tile_x = reader.read_i32()?;
            let tile_z = reader.read_i32()?;
            let width = reader.read_i32()?;
            let depth = reader.read_i32()?;
            let border_size = reader.read_i32()?;
            let mut bounds_min = read_vec3(&mut reader)?;
            let mut bounds_max = read_vec3(&mut reader)?;
            if legacy {
                // Bounds are local, make them global
                bounds_min += world_min;
                bounds_max += world_min;
            }
            let cell_size = reader.read_f32()?;
            let cell_height = reader.read_f32()?;

            let voxel_size = reader.read_i32()?;
            let voxel_size = usize::try_from(voxel_size).map_err(|_| {
                Error::InvalidFormat(format!(
                    "tile ({}, {}) has negative payload size {}",
                    tile_x, tile_z, voxel_size
                ))
            })?;
            let mut voxel_data = reader.read_bytes(voxel_size)?;
            if let Some(compressor) = compressor {
                voxel_data = compressor.decompress(&voxel_data)?;
            }

            let mut tile = VoxelTile::new(
                tile_x,
                tile_z,
                width,
                depth,
                bounds_min,
                bounds_max,
                cell_size,
                cell_height,
                border_size,
                Vec::new(),
            );
            tile.span_data = tile.transcode_spans(&voxel_data, order, ByteOrder::BigEndian)?;
            file.add_tile(tile);
        }

        log::info!(
            "Read voxel file: {} tiles, version {:#06x}, {:?}",
            file.tiles.len(),
            file.version,
            order
        );
        Ok(file)
    }
}

fn read_vec3<R: Read>(reader: &mut OrderedReader<R>) -> Result<Vec3> {
    Ok(Vec3::new(reader.read_f32()?, reader.read_f32()?, reader.read_f32()?))
}
