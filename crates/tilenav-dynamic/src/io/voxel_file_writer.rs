use super::byte_order::{ByteOrder, OrderedWriter};
use super::voxel_file_reader::LEGACY_HEADER_PADDING;
use super::{
    Lz4Compressor, VoxelCompressor, VoxelFile, VERSION_COMPRESSION_LZ4, VERSION_COMPRESSION_NONE,
    VERSION_EXPORTER_LEGACY, VERSION_EXPORTER_NATIVE, VOXEL_FILE_MAGIC,
};
use glam::Vec3;
use std::io::Write;
use tilenav_common::Result;

pub struct VoxelFileWriter {
    compressor: Box<dyn VoxelCompressor>,
}

impl Default for VoxelFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelFileWriter {
    /// Writer that compresses with LZ4 when asked to
    pub fn new() -> Self {
        Self::with_compressor(Box::new(Lz4Compressor))
    }

    pub fn with_compressor(compressor: Box<dyn VoxelCompressor>) -> Self {
        VoxelFileWriter { compressor }
    }

    /// Writes `file` in the requested byte order.
    ///
    /// With `legacy` set the header omits the native-only build parameters,
    /// bounds are stored as center and size, tile bounds are stored relative
    /// to the world minimum and the header ends with struct padding.
    pub fn write<W: Write>(
        &self,
        writer: W,
        file: &VoxelFile,
        byte_order: ByteOrder,
        compression: bool,
        legacy: bool,
    ) -> Result<()> {
        let mut out = OrderedWriter::new(writer, byte_order);

        let exporter = if legacy {
            VERSION_EXPORTER_LEGACY
        } else {
            VERSION_EXPORTER_NATIVE
        };
        let codec = if compression {
            VERSION_COMPRESSION_LZ4
        } else {
            VERSION_COMPRESSION_NONE
        };
        out.write_u32(VOXEL_FILE_MAGIC)?;
        out.write_u32(exporter | codec)?;

        out.write_f32(file.walkable_radius)?;
        out.write_f32(file.walkable_height)?;
        out.write_f32(file.walkable_climb)?;
        out.write_f32(file.walkable_slope_angle)?;
        out.write_f32(file.cell_size)?;
        out.write_f32(file.max_simplification_error)?;
        out.write_f32(file.max_edge_len)?;
        out.write_f32(file.min_region_area)?;
        if !legacy {
            out.write_f32(file.region_merge_area)?;
            out.write_i32(file.verts_per_poly)?;
            out.write_bool(file.build_mesh_detail)?;
            out.write_f32(file.detail_sample_distance)?;
            out.write_f32(file.detail_sample_max_error)?;
        }

        out.write_bool(file.use_tiles)?;
        out.write_i32(file.tile_size_x)?;
        out.write_i32(file.tile_size_z)?;
        write_vec3(&mut out, file.rotation)?;

        let world_min = file.bounds_min();
        let world_max = file.bounds_max();
        if legacy {
            write_vec3(&mut out, (world_min + world_max) * 0.5)?;
            write_vec3(&mut out, world_max - world_min)?;
            out.write_bytes(&[0u8; LEGACY_HEADER_PADDING])?;
        } else {
            write_vec3(&mut out, world_min)?;
            write_vec3(&mut out, world_max)?;
        }

        out.write_i32(file.tiles.len() as i32)?;
        for tile in &file.tiles {
            out.write_i32(tile.tile_x)?;
            out.write_i32(tile.tile_z)?;
            out.write_i32(tile.width)?;
            out.write_i32(tile.depth)?;
            out.write_i32(tile.border_size)?;
            if legacy {
                write_vec3(&mut out, tile.bounds_min - world_min)?;
                write_vec3(&mut out, tile.bounds_max - world_min)?;
            } else {
                write_vec3(&mut out, tile.bounds_min)?;
                write_vec3(&mut out, tile.bounds_max)?;
            }
            out.write_f32(tile.cell_size)?;
            out.write_f32(tile.cell_height)?;

            let mut payload = tile.transcode_spans(&tile.span_data, ByteOrder::BigEndian, byte_order)?;
            if compression {
                payload = self.compressor.compress(&payload)?;
            }
            out.write_i32(payload.len() as i32)?;
            out.write_bytes(&payload)?;
        }

        log::info!(
            "Wrote voxel file: {} tiles, {:?}, compression {}, legacy {}",
            file.tiles.len(),
            byte_order,
            compression,
            legacy
        );
        Ok(())
    }
}

fn write_vec3<W: Write>(out: &mut OrderedWriter<W>, v: Vec3) -> Result<()> {
    out.write_f32(v.x)?;
    out.write_f32(v.y)?;
    out.write_f32(v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{VoxelFileReader, VoxelTile};
    use crate::test_helpers::{ground_file, ground_tile};
    use tilenav_common::{Error, Heightfield};

    const EPS: f32 = 1e-4;

    fn sample_file() -> VoxelFile {
        let mut file = ground_file(2, 1);
        file.walkable_radius = 0.6;
        file.walkable_height = 2.0;
        file.walkable_climb = 0.9;
        file.walkable_slope_angle = 45.0;
        file.max_simplification_error = 1.3;
        file.max_edge_len = 12.0;
        file.min_region_area = 8.0;
        file.region_merge_area = 20.0;
        file.verts_per_poly = 5;
        file.detail_sample_distance = 6.0;
        file.detail_sample_max_error = 1.0;
        file.rotation = Vec3::new(0.0, 90.0, 0.0);

        // Uneven tile so payloads differ per tile
        let mut hf = Heightfield::new(8, 8, Vec3::new(16.0, -1.0, 0.0), Vec3::new(24.0, 4.0, 8.0), 1.0, 0.5);
        hf.add_span(3, 4, 0, 2, 63, 0).unwrap();
        hf.add_span(3, 4, 6, 9, 1, 0).unwrap();
        file.add_tile(VoxelTile::from_heightfield(2, 0, &hf));
        file
    }

    fn encode(file: &VoxelFile, order: ByteOrder, compression: bool, legacy: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        VoxelFileWriter::new()
            .write(&mut bytes, file, order, compression, legacy)
            .unwrap();
        bytes
    }

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() < EPS, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_native_round_trip_in_every_mode() {
        let file = sample_file();
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            for compression in [false, true] {
                let bytes = encode(&file, order, compression, false);
                let back = VoxelFileReader::new().read(bytes.as_slice()).unwrap();

                assert_eq!(back.is_compressed(), compression);
                assert!(!back.is_legacy());
                assert_eq!(back.verts_per_poly, 5);
                assert_eq!(back.tile_size_x, file.tile_size_x);
                assert_eq!(back.region_merge_area, 20.0);
                assert_eq!(back.rotation, file.rotation);
                assert_eq!(back.bounds, file.bounds);
                assert_eq!(back.tiles, file.tiles, "{:?} compression={}", order, compression);
            }
        }
    }

    #[test]
    fn test_byte_order_is_detected_from_magic() {
        let file = sample_file();
        let big = encode(&file, ByteOrder::BigEndian, false, false);
        let little = encode(&file, ByteOrder::LittleEndian, false, false);
        assert_eq!(&big[..4], b"VOXL");
        assert_eq!(&little[..4], b"LXOV");
        assert_ne!(big, little);

        let from_big = VoxelFileReader::new().read(big.as_slice()).unwrap();
        let from_little = VoxelFileReader::new().read(little.as_slice()).unwrap();
        assert_eq!(from_big, from_little);
    }

    #[test]
    fn test_legacy_round_trip() {
        let file = sample_file();
        let native = encode(&file, ByteOrder::LittleEndian, false, false);
        let legacy = encode(&file, ByteOrder::LittleEndian, false, true);
        // Drops 5 native fields (17 bytes) and adds 2 bytes of padding
        assert_eq!(native.len() - legacy.len(), 17 - 2);

        let back = VoxelFileReader::new().read(legacy.as_slice()).unwrap();
        assert!(back.is_legacy());
        assert_vec3_near(back.bounds_min(), file.bounds_min());
        assert_vec3_near(back.bounds_max(), file.bounds_max());

        // Fields the legacy layout cannot hold are derived
        assert_eq!(back.verts_per_poly, 6);
        assert!(back.build_mesh_detail);
        assert!((back.region_merge_area - 48.0).abs() < EPS);
        assert!((back.detail_sample_distance - 6.0).abs() < EPS);
        assert!((back.detail_sample_max_error - 1.04).abs() < EPS);

        for (a, b) in back.tiles.iter().zip(&file.tiles) {
            assert_eq!((a.tile_x, a.tile_z, a.width, a.depth), (b.tile_x, b.tile_z, b.width, b.depth));
            assert_vec3_near(a.bounds_min, b.bounds_min);
            assert_vec3_near(a.bounds_max, b.bounds_max);
            assert_eq!(a.span_data, b.span_data);
        }
    }

    #[test]
    fn test_legacy_round_trip_in_every_mode() {
        let file = sample_file();
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            for compression in [false, true] {
                let bytes = encode(&file, order, compression, true);
                let back = VoxelFileReader::new().read(bytes.as_slice()).unwrap();

                assert!(back.is_legacy(), "{:?} compression={}", order, compression);
                assert_eq!(back.is_compressed(), compression);
                assert_eq!(back.tile_size_x, file.tile_size_x);
                assert_vec3_near(back.bounds_min(), file.bounds_min());
                assert_vec3_near(back.bounds_max(), file.bounds_max());
                assert_eq!(back.tiles.len(), file.tiles.len());
                for (a, b) in back.tiles.iter().zip(&file.tiles) {
                    assert_eq!((a.tile_x, a.tile_z), (b.tile_x, b.tile_z));
                    assert_vec3_near(a.bounds_min, b.bounds_min);
                    assert_vec3_near(a.bounds_max, b.bounds_max);
                    assert_eq!(a.span_data, b.span_data, "{:?} compression={}", order, compression);
                }
            }
        }
    }

    #[test]
    fn test_oversized_payload_length_is_rejected() {
        let file = VoxelFile::from_tiles(
            &crate::config::DynamicNavMeshConfig::default(),
            vec![ground_tile(0, 0)],
        );
        let mut bytes = encode(&file, ByteOrder::BigEndian, false, true);

        // Header as in the legacy bounds layout, then tile bounds and cell sizes
        let offset = 4 + 4 + 8 * 4 + 1 + 2 * 4 + 3 * 4 + 3 * 4 + 3 * 4 + 2 + 4 + 5 * 4 + 6 * 4 + 2 * 4;
        let declared = i32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
        assert_eq!(declared as usize, file.tiles[0].span_data.len());

        bytes[offset..offset + 4].copy_from_slice(&i32::MAX.to_be_bytes());
        assert!(matches!(
            VoxelFileReader::new().read(bytes.as_slice()),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_legacy_tile_bounds_are_local() {
        let mut file = VoxelFile::from_tiles(
            &crate::config::DynamicNavMeshConfig::default(),
            vec![ground_tile(1, 1)],
        );
        file.bounds = [8.0, -1.0, 8.0, 16.0, 4.0, 16.0];
        let bytes = encode(&file, ByteOrder::BigEndian, false, true);

        // magic, version, 8 params, use_tiles, 2 tile sizes, rotation,
        // center, size, padding, tile count, 5 tile ints
        let offset = 4 + 4 + 8 * 4 + 1 + 2 * 4 + 3 * 4 + 3 * 4 + 3 * 4 + 2 + 4 + 5 * 4;
        let min_x = f32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
        assert_eq!(min_x, 0.0);
    }

    #[test]
    fn test_reader_rejects_bad_input() {
        let file = sample_file();

        let mut bad_magic = encode(&file, ByteOrder::BigEndian, false, false);
        bad_magic[0] = b'X';
        assert!(matches!(
            VoxelFileReader::new().read(bad_magic.as_slice()),
            Err(Error::InvalidFormat(_))
        ));

        let mut bad_exporter = encode(&file, ByteOrder::BigEndian, false, false);
        bad_exporter[6] = 0x21;
        assert!(matches!(
            VoxelFileReader::new().read(bad_exporter.as_slice()),
            Err(Error::UnsupportedVersion(0x2100))
        ));

        let mut bad_codec = encode(&file, ByteOrder::BigEndian, false, false);
        bad_codec[6] = 0x12;
        assert!(matches!(
            VoxelFileReader::new().read(bad_codec.as_slice()),
            Err(Error::UnsupportedVersion(0x1200))
        ));

        let compressed = encode(&file, ByteOrder::BigEndian, true, false);
        assert!(matches!(
            VoxelFileReader::without_compressor().read(compressed.as_slice()),
            Err(Error::Compression(_))
        ));

        let truncated = encode(&file, ByteOrder::LittleEndian, false, false);
        let truncated = &truncated[..truncated.len() - 5];
        assert!(matches!(
            VoxelFileReader::new().read(truncated),
            Err(Error::Io(_))
        ));
    }
}
