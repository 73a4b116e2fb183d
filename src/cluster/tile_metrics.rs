//! TileMetricsOut interop file reader
//!
//! TileMetricsOut.bin reports per-tile run statistics such as cluster density
//! and counts:
//!
//! ```text
//! Byte 0      : u8 version, must equal 2
//! Byte 1      : u8 record size, must equal 10
//! Records     : u16 lane, u16 tile, u16 metric code, f32 value
//! ```
//!
//! Records are decoded verbatim; interpreting metric codes is left to the
//! caller.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use super::iter::{BinaryFileIterator, Element};
use crate::error::{HeaderError, ReadError, Result};

const HEADER_SIZE: usize = 2;
const SUPPORTED_VERSION: u8 = 2;
const RECORD_SIZE: u8 = 10;

/// One tile metric: which tile, which statistic, and its value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMetricsRecord {
    pub lane: u16,
    pub tile: u16,
    pub code: u16,
    pub value: f32,
}

impl Element for TileMetricsRecord {
    const SIZE: usize = RECORD_SIZE as usize;

    fn decode(buf: &[u8]) -> Self {
        Self {
            lane: LittleEndian::read_u16(&buf[0..2]),
            tile: LittleEndian::read_u16(&buf[2..4]),
            code: LittleEndian::read_u16(&buf[4..6]),
            value: LittleEndian::read_f32(&buf[6..10]),
        }
    }
}

/// A forward-only pull iterator over the records of one TileMetricsOut file
#[derive(Debug)]
pub struct TileMetricsReader {
    iter: BinaryFileIterator<TileMetricsRecord>,
}

impl TileMetricsReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let iter = BinaryFileIterator::new(HEADER_SIZE, path)?;
        let header = iter.header_bytes();
        if header[0] != SUPPORTED_VERSION {
            return Err(HeaderError::UnsupportedVersion {
                found: u32::from(header[0]),
                expected: u32::from(SUPPORTED_VERSION),
            }
            .into());
        }
        if header[1] != RECORD_SIZE {
            return Err(HeaderError::InvalidHeaderField {
                field: "tile metrics record size",
                found: header[1].to_string(),
            }
            .into());
        }
        if iter.extra_bytes() != 0 {
            return Err(ReadError::TrailingBytes {
                expected: HEADER_SIZE as u64 + iter.elements_in_file() * TileMetricsRecord::SIZE as u64,
                found: HEADER_SIZE as u64
                    + iter.elements_in_file() * TileMetricsRecord::SIZE as u64
                    + iter.extra_bytes(),
            }
            .into());
        }
        Ok(Self { iter })
    }

    /// The number of whole records in the file body
    #[must_use]
    pub fn num_records(&self) -> u64 {
        self.iter.elements_in_file()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.iter.has_next()
    }

    pub fn next(&mut self) -> Result<TileMetricsRecord> {
        self.iter.next_element()
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn metrics_file(
        version: u8,
        record_size: u8,
        records: &[(u16, u16, u16, f32)],
    ) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&[version, record_size])?;
        for (lane, tile, code, value) in records {
            file.write_all(&lane.to_le_bytes())?;
            file.write_all(&tile.to_le_bytes())?;
            file.write_all(&code.to_le_bytes())?;
            file.write_all(&value.to_le_bytes())?;
        }
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_read_records() -> Result<()> {
        let file = metrics_file(2, 10, &[(1, 1101, 100, 250_000.0), (1, 1102, 103, 42.0)])?;
        let mut reader = TileMetricsReader::new(file.path())?;
        assert_eq!(reader.num_records(), 2);

        let first = reader.next()?;
        assert_eq!(first.lane, 1);
        assert_eq!(first.tile, 1101);
        assert_eq!(first.code, 100);
        assert_eq!(first.value, 250_000.0);

        let second = reader.next()?;
        assert_eq!((second.tile, second.code), (1102, 103));

        assert!(!reader.has_next());
        Ok(())
    }

    #[test]
    fn test_version_and_record_size_validated() -> Result<()> {
        let file = metrics_file(3, 10, &[])?;
        assert!(TileMetricsReader::new(file.path()).is_err());

        let file = metrics_file(2, 12, &[])?;
        let err = TileMetricsReader::new(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::HeaderError(HeaderError::InvalidHeaderField { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_partial_record_rejected() -> Result<()> {
        let file = metrics_file(2, 10, &[(1, 1101, 100, 1.0)])?;
        let mut bytes = std::fs::read(file.path())?;
        bytes.extend_from_slice(&[0, 0, 0]);
        std::fs::write(file.path(), bytes)?;
        assert!(TileMetricsReader::new(file.path()).is_err());
        Ok(())
    }
}
