//! Little-endian byte framing
//!
//! This module provides the primitive read/write layer that all binary formats
//! in this crate are built on. Integers, floats, and NUL-terminated strings
//! are always encoded little-endian regardless of host platform.
//!
//! Reads are strict: a primitive that cannot be filled completely from the
//! underlying stream fails with [`ReadError::UnexpectedEndOfStream`] rather
//! than being silently zero-padded, and a string that hits end-of-stream
//! before its terminator is an error, not an empty string.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ReadError, Result};

/// Translate a short read into the crate-level end-of-stream error.
fn map_eof(err: io::Error) -> crate::Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ReadError::UnexpectedEndOfStream.into()
    } else {
        err.into()
    }
}

/// A reader of little-endian primitives over any [`Read`] source
///
/// Every read method consumes exactly the number of bytes the primitive
/// requires or fails with [`ReadError::UnexpectedEndOfStream`].
pub struct LittleEndianReader<R: Read> {
    inner: R,
}

impl<R: Read> LittleEndianReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(map_eof)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.inner.read_i16::<LittleEndian>().map_err(map_eof)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.inner.read_u16::<LittleEndian>().map_err(map_eof)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.inner.read_i32::<LittleEndian>().map_err(map_eof)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.inner.read_u32::<LittleEndian>().map_err(map_eof)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.inner.read_i64::<LittleEndian>().map_err(map_eof)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.inner.read_u64::<LittleEndian>().map_err(map_eof)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.inner.read_f32::<LittleEndian>().map_err(map_eof)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.inner.read_f64::<LittleEndian>().map_err(map_eof)
    }

    /// Reads a NUL-terminated UTF-8 string
    ///
    /// Bytes are appended until a `0x00` terminator is consumed. Reaching
    /// end-of-stream before the terminator is an
    /// [`ReadError::UnexpectedEndOfStream`] error.
    pub fn read_string(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(std::str::from_utf8(&bytes)?.to_string())
    }

    /// Consumes the reader and returns the inner source
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// A writer of little-endian primitives over any [`Write`] sink
///
/// The writer tracks a running count of bytes written, which callers use to
/// record block offsets while serializing.
pub struct LittleEndianWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> LittleEndianWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// The number of bytes written so far
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.inner.write_i16::<LittleEndian>(value)?;
        self.written += 2;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(value)?;
        self.written += 2;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner.write_i32::<LittleEndian>(value)?;
        self.written += 4;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(value)?;
        self.written += 4;
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.inner.write_i64::<LittleEndian>(value)?;
        self.written += 8;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.inner.write_u64::<LittleEndian>(value)?;
        self.written += 8;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.inner.write_f32::<LittleEndian>(value)?;
        self.written += 4;
        Ok(())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.inner.write_f64::<LittleEndian>(value)?;
        self.written += 8;
        Ok(())
    }

    /// Writes a string followed by a `0x00` terminator
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.inner.write_all(value.as_bytes())?;
        self.written += value.len() as u64;
        self.write_u8(0)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consumes the writer and returns the inner sink
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;
    use std::io::Cursor;

    #[test]
    fn test_primitive_round_trip() -> Result<()> {
        let mut writer = LittleEndianWriter::new(Vec::new());
        writer.write_u8(0xAB)?;
        writer.write_i16(-2)?;
        writer.write_i32(1_480_870_228)?;
        writer.write_i64(-1)?;
        writer.write_f32(1.0)?;
        writer.write_f64(2.5)?;
        writer.write_string("chr1")?;
        assert_eq!(writer.bytes_written(), 1 + 2 + 4 + 8 + 4 + 8 + 5);

        let buf = writer.into_inner();
        let mut reader = LittleEndianReader::new(Cursor::new(buf));
        assert_eq!(reader.read_u8()?, 0xAB);
        assert_eq!(reader.read_i16()?, -2);
        assert_eq!(reader.read_i32()?, 1_480_870_228);
        assert_eq!(reader.read_i64()?, -1);
        assert_eq!(reader.read_f32()?, 1.0);
        assert_eq!(reader.read_f64()?, 2.5);
        assert_eq!(reader.read_string()?, "chr1");
        Ok(())
    }

    #[test]
    fn test_little_endian_byte_order() -> Result<()> {
        let mut writer = LittleEndianWriter::new(Vec::new());
        writer.write_u32(0x5844_4954)?;
        let buf = writer.into_inner();
        assert_eq!(buf, b"TIDX");
        Ok(())
    }

    #[test]
    fn test_short_read_is_fatal() {
        // 8-byte primitive over a 4-byte buffer must not zero-pad
        let mut reader = LittleEndianReader::new(Cursor::new(vec![1u8, 2, 3, 4]));
        let err = reader.read_i64().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ReadError(ReadError::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let mut reader = LittleEndianReader::new(Cursor::new(b"chr1".to_vec()));
        let err = reader.read_string().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ReadError(ReadError::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn test_empty_string_round_trip() -> Result<()> {
        let mut writer = LittleEndianWriter::new(Vec::new());
        writer.write_string("")?;
        let mut reader = LittleEndianReader::new(Cursor::new(writer.into_inner()));
        assert_eq!(reader.read_string()?, "");
        Ok(())
    }
}
