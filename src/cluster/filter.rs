//! Pass-filter file reader
//!
//! Filter files store Illumina's per-cluster quality gate, one byte per
//! cluster:
//!
//! ```text
//! Bytes 0-3   : u32 reserved (zero)
//! Bytes 4-7   : u32 version, must equal 3
//! Bytes 8-11  : u32 cluster count
//! Bytes 12..  : 1 byte per cluster, 0x00 fail / 0x01 pass
//! ```
//!
//! Decoding requires an exact byte match: any body value other than `0x00` or
//! `0x01` is malformed. The looser "check only the low bit" reading sometimes
//! described for this format is deliberately not implemented.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use super::iter::BinaryFileIterator;
use crate::error::{HeaderError, ReadError, Result};

const HEADER_SIZE: usize = 12;
const SUPPORTED_VERSION: u32 = 3;

/// A forward-only pull iterator over the pass-filter flags of one filter file
#[derive(Debug)]
pub struct FilterReader {
    iter: BinaryFileIterator<u8>,
    num_clusters: u32,
    cluster_index: u32,
}

impl FilterReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let iter = BinaryFileIterator::new(HEADER_SIZE, path)?;
        let header = iter.header_bytes();
        let reserved = LittleEndian::read_u32(&header[0..4]);
        if reserved != 0 {
            return Err(HeaderError::InvalidHeaderField {
                field: "filter reserved",
                found: reserved.to_string(),
            }
            .into());
        }
        let version = LittleEndian::read_u32(&header[4..8]);
        if version != SUPPORTED_VERSION {
            return Err(HeaderError::UnsupportedVersion {
                found: version,
                expected: SUPPORTED_VERSION,
            }
            .into());
        }
        let num_clusters = LittleEndian::read_u32(&header[8..12]);
        iter.assert_total_elements_equal(u64::from(num_clusters))?;

        Ok(Self {
            iter,
            num_clusters,
            cluster_index: 0,
        })
    }

    /// The cluster count declared in the header
    #[must_use]
    pub fn num_clusters(&self) -> u32 {
        self.num_clusters
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cluster_index < self.num_clusters
    }

    /// Returns the next pass-filter flag
    ///
    /// # Errors
    ///
    /// Fails with [`ReadError::InvalidFilterByte`] on any body byte other
    /// than `0x00` or `0x01`.
    pub fn next(&mut self) -> Result<bool> {
        if !self.has_next() {
            return Err(ReadError::Exhausted.into());
        }
        let byte = self.iter.next_element()?;
        self.cluster_index += 1;
        match byte {
            0x00 => Ok(false),
            0x01 => Ok(true),
            other => Err(ReadError::InvalidFilterByte(other).into()),
        }
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn filter_file(version: u32, num_clusters: u32, body: &[u8]) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&0u32.to_le_bytes())?;
        file.write_all(&version.to_le_bytes())?;
        file.write_all(&num_clusters.to_le_bytes())?;
        file.write_all(body)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_reserved_field_must_be_zero() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&7u32.to_le_bytes())?;
        file.write_all(&3u32.to_le_bytes())?;
        file.write_all(&1u32.to_le_bytes())?;
        file.write_all(&[0x01])?;
        file.flush()?;

        let err = FilterReader::new(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::HeaderError(HeaderError::InvalidHeaderField { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_read_flags() -> Result<()> {
        let file = filter_file(3, 4, &[0x01, 0x00, 0x00, 0x01])?;
        let mut reader = FilterReader::new(file.path())?;
        assert_eq!(reader.num_clusters(), 4);

        let mut flags = Vec::new();
        while reader.has_next() {
            flags.push(reader.next()?);
        }
        assert_eq!(flags, vec![true, false, false, true]);
        Ok(())
    }

    #[test]
    fn test_unsupported_version() -> Result<()> {
        let file = filter_file(2, 1, &[0x01])?;
        let err = FilterReader::new(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::HeaderError(HeaderError::UnsupportedVersion { found: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_exact_byte_match_required() -> Result<()> {
        // 0x03 has the low bit set but is still illegal
        let file = filter_file(3, 2, &[0x01, 0x03])?;
        let mut reader = FilterReader::new(file.path())?;
        assert!(reader.next()?);
        let err = reader.next().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ReadError(ReadError::InvalidFilterByte(0x03))
        ));
        Ok(())
    }

    #[test]
    fn test_cluster_count_mismatch() -> Result<()> {
        let file = filter_file(3, 3, &[0x01, 0x00])?;
        assert!(FilterReader::new(file.path()).is_err());
        Ok(())
    }
}
