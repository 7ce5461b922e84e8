use tilenav_common::{Error, Result};

/// Byte codec applied to each tile's span payload
pub trait VoxelCompressor: Send + Sync {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// LZ4 block compression with a little-endian size prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compressor;

impl VoxelCompressor for Lz4Compressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(data))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(data).map_err(|e| Error::Compression(e.to_string()))
    }
}
