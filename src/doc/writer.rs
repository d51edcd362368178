//! Interchange document output stream.
//!
//! All multi-byte values are little-endian. The writer appends to an
//! in-memory buffer; a whole document is produced per copy and handed to
//! the transport layer as one byte buffer.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::util::{Result, Vec3, Vec4};

/// Output stream for writing an interchange document.
#[derive(Default)]
pub struct DocWriter {
    buf: Vec<u8>,
}

impl DocWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer, returning the document bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.buf.write_all(data)?;
        Ok(())
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.buf.write_u8(value)?;
        Ok(())
    }

    /// Write a u16 value (little-endian).
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.buf.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.buf.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write an f32 value (little-endian).
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.buf.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a Vec3 as three f32 values.
    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)
    }

    /// Write a Vec4 as four f32 values.
    pub fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)?;
        self.write_f32(v.w)
    }

    /// Write a slice of Vec3 values as packed f32 triples.
    ///
    /// POD cast: interchange data is little-endian, as are all supported
    /// host platforms.
    pub fn write_vec3_slice(&mut self, values: &[Vec3]) -> Result<()> {
        self.write_bytes(bytemuck::cast_slice(values))
    }

    /// Write a slice of Vec4 values as packed f32 quadruples.
    pub fn write_vec4_slice(&mut self, values: &[Vec4]) -> Result<()> {
        self.write_bytes(bytemuck::cast_slice(values))
    }

    /// Write a slice of f32 values packed.
    pub fn write_f32_slice(&mut self, values: &[f32]) -> Result<()> {
        self.write_bytes(bytemuck::cast_slice(values))
    }

    /// Write a length-prefixed UTF-8 string (u32 length).
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_u32(s.len() as u32)?;
        self.write_bytes(s.as_bytes())
    }

    /// Write a length-prefixed byte payload (u32 length).
    pub fn write_payload(&mut self, data: &[u8]) -> Result<()> {
        self.write_u32(data.len() as u32)?;
        self.write_bytes(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut w = DocWriter::new();
        w.write_u16(0x0102).unwrap();
        w.write_u32(0x03040506).unwrap();
        assert_eq!(w.into_bytes(), vec![0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);
    }

    #[test]
    fn test_write_str() {
        let mut w = DocWriter::new();
        w.write_str("uv").unwrap();
        assert_eq!(w.into_bytes(), vec![2, 0, 0, 0, b'u', b'v']);
    }
}
