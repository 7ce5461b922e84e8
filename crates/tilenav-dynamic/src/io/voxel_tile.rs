use super::byte_order::{ByteOrder, OrderedReader, OrderedWriter};
use glam::Vec3;
use std::io::Cursor;
use tilenav_common::{Error, Heightfield, Result, Span};

const SERIALIZED_SPAN_COUNT_BYTES: usize = 2;
const SERIALIZED_SPAN_BYTES: usize = 12;

/// Raw heightfield of one tile as stored in a voxel file
///
/// `span_data` is kept decompressed and big-endian regardless of the file it
/// came from; readers and writers transcode at the file boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelTile {
    pub tile_x: i32,
    pub tile_z: i32,
    pub border_size: i32,
    pub width: i32,
    pub depth: i32,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub cell_size: f32,
    pub cell_height: f32,
    pub span_data: Vec<u8>,
}

impl VoxelTile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tile_x: i32,
        tile_z: i32,
        width: i32,
        depth: i32,
        bounds_min: Vec3,
        bounds_max: Vec3,
        cell_size: f32,
        cell_height: f32,
        border_size: i32,
        span_data: Vec<u8>,
    ) -> Self {
        VoxelTile {
            tile_x,
            tile_z,
            border_size,
            width,
            depth,
            bounds_min,
            bounds_max,
            cell_size,
            cell_height,
            span_data,
        }
    }

    pub fn from_heightfield(tile_x: i32, tile_z: i32, heightfield: &Heightfield) -> Self {
        VoxelTile {
            tile_x,
            tile_z,
            border_size: heightfield.border_size,
            width: heightfield.width,
            depth: heightfield.height,
            bounds_min: heightfield.bmin,
            bounds_max: heightfield.bmax,
            cell_size: heightfield.cs,
            cell_height: heightfield.ch,
            span_data: serialize_spans(heightfield),
        }
    }

    /// Decodes the span payload into a fresh heightfield
    ///
    /// The grid size is checked against the payload before anything is
    /// allocated.
    pub fn heightfield(&self) -> Result<Heightfield> {
        self.validate_grid()?;
        decode_spans(
            &self.span_data,
            ByteOrder::BigEndian,
            Heightfield::new(
                self.width,
                self.depth,
                self.bounds_min,
                self.bounds_max,
                self.cell_size,
                self.cell_height,
            )
            .with_border_size(self.border_size),
        )
    }

    /// Rejects grid sizes the span payload cannot hold, since every cell
    /// needs at least its span count
    fn validate_grid(&self) -> Result<()> {
        if self.width < 0 || self.depth < 0 {
            return Err(Error::InvalidFormat(format!(
                "tile ({}, {}) has negative size {}x{}",
                self.tile_x, self.tile_z, self.width, self.depth
            )));
        }
        let min_len = (self.width as usize)
            .checked_mul(self.depth as usize)
            .and_then(|cells| cells.checked_mul(SERIALIZED_SPAN_COUNT_BYTES));
        match min_len {
            Some(min_len) if min_len <= self.span_data.len() => Ok(()),
            _ => Err(Error::InvalidFormat(format!(
                "tile ({}, {}) size {}x{} does not fit a {} byte span payload",
                self.tile_x,
                self.tile_z,
                self.width,
                self.depth,
                self.span_data.len()
            ))),
        }
    }

    fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.depth.max(0) as usize)
    }

    /// Re-encodes a span payload from one byte order to another
    pub fn transcode_spans(&self, data: &[u8], from: ByteOrder, to: ByteOrder) -> Result<Vec<u8>> {
        if from == to {
            return Ok(data.to_vec());
        }
        let mut reader = OrderedReader::new(Cursor::new(data), from);
        let mut writer = OrderedWriter::new(Vec::with_capacity(data.len()), to);
        for _ in 0..self.cell_count() {
            let count = reader.read_u16()?;
            writer.write_u16(count)?;
            for _ in 0..count as usize * 3 {
                writer.write_i32(reader.read_i32()?)?;
            }
        }
        let out = writer.into_inner();
        if out.len() != data.len() {
            return Err(Error::InvalidFormat(format!(
                "tile ({}, {}) span payload has {} trailing bytes",
                self.tile_x,
                self.tile_z,
                data.len() - out.len()
            )));
        }
        Ok(out)
    }
}

fn serialize_spans(heightfield: &Heightfield) -> Vec<u8> {
    let cells = (heightfield.width.max(0) * heightfield.height.max(0)) as usize;
    let size = cells * SERIALIZED_SPAN_COUNT_BYTES + heightfield.span_count() * SERIALIZED_SPAN_BYTES;
    let mut out = Vec::with_capacity(size);
    for z in 0..heightfield.height {
        for x in 0..heightfield.width {
            let column = heightfield.column(x, z).unwrap_or(&[]);
            out.extend_from_slice(&(column.len() as u16).to_be_bytes());
            for span in column {
                out.extend_from_slice(&span.min.to_be_bytes());
                out.extend_from_slice(&span.max.to_be_bytes());
                out.extend_from_slice(&(span.area as i32).to_be_bytes());
            }
        }
    }
    out
}

fn decode_spans(data: &[u8], order: ByteOrder, mut heightfield: Heightfield) -> Result<Heightfield> {
    let mut reader = OrderedReader::new(Cursor::new(data), order);
    let mut consumed = 0usize;
    for z in 0..heightfield.height {
        for x in 0..heightfield.width {
            let count = reader.read_u16()? as usize;
            consumed += SERIALIZED_SPAN_COUNT_BYTES + count * SERIALIZED_SPAN_BYTES;
            for _ in 0..count {
                let min = reader.read_i32()?;
                let max = reader.read_i32()?;
                let area = reader.read_i32()?;
                let area = u8::try_from(area).map_err(|_| {
                    Error::InvalidFormat(format!("span area {} out of range at ({}, {})", area, x, z))
                })?;
                heightfield.push_span(x, z, Span::new(min, max, area))?;
            }
        }
    }
    if consumed != data.len() {
        return Err(Error::InvalidFormat(format!(
            "span payload is {} bytes, expected {}",
            data.len(),
            consumed
        )));
    }
    Ok(heightfield)
}
