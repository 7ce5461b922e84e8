use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use tilenav_common::Result;

/// Byte order of the multi-byte values in a voxel file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Finds the byte order in which `bytes` spell `expected`.
    ///
    /// Big endian is tried first, then the swapped order.
    pub fn detect(bytes: [u8; 4], expected: u32) -> Option<Self> {
        if u32::from_be_bytes(bytes) == expected {
            Some(ByteOrder::BigEndian)
        } else if u32::from_le_bytes(bytes) == expected {
            Some(ByteOrder::LittleEndian)
        } else {
            None
        }
    }
}

/// Reads primitives in a byte order chosen at runtime
pub(crate) struct OrderedReader<R> {
    inner: R,
    order: ByteOrder,
}

impl<R: Read> OrderedReader<R> {
    pub fn new(inner: R, order: ByteOrder) -> Self {
        Self { inner, order }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.read_u16::<BigEndian>()?,
            ByteOrder::LittleEndian => self.inner.read_u16::<LittleEndian>()?,
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.read_u32::<BigEndian>()?,
            ByteOrder::LittleEndian => self.inner.read_u32::<LittleEndian>()?,
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.read_i32::<BigEndian>()?,
            ByteOrder::LittleEndian => self.inner.read_i32::<LittleEndian>()?,
        })
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.read_f32::<BigEndian>()?,
            ByteOrder::LittleEndian => self.inner.read_f32::<LittleEndian>()?,
        })
    }

    /// Reads exactly `len` bytes, growing the buffer only as data arrives
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, found {}", len, buf.len()),
            )
            .into());
        }
        Ok(buf)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }
}

/// Writes primitives in a byte order chosen at runtime
pub(crate) struct OrderedWriter<W> {
    inner: W,
    order: ByteOrder,
}

impl<W: Write> OrderedWriter<W> {
    pub fn new(inner: W, order: ByteOrder) -> Self {
        Self { inner, order }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        Ok(self.inner.write_u8(value)?)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.write_u16::<BigEndian>(value)?,
            ByteOrder::LittleEndian => self.inner.write_u16::<LittleEndian>(value)?,
        })
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.write_u32::<BigEndian>(value)?,
            ByteOrder::LittleEndian => self.inner.write_u32::<LittleEndian>(value)?,
        })
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.write_i32::<BigEndian>(value)?,
            ByteOrder::LittleEndian => self.inner.write_i32::<LittleEndian>(value)?,
        })
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        Ok(match self.order {
            ByteOrder::BigEndian => self.inner.write_f32::<BigEndian>(value)?,
            ByteOrder::LittleEndian => self.inner.write_f32::<LittleEndian>(value)?,
        })
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.inner.write_all(bytes)?)
    }
}
