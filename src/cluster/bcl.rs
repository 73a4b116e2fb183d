//! BCL base call file reader
//!
//! BCL files carry one (base, quality) pair per cluster:
//!
//! ```text
//! Bytes 0-3  : u32 cluster count (little endian)
//! Bytes 4..  : 1 byte per cluster
//! ```
//!
//! The two least significant bits of each byte select the base
//! (`00 A, 01 C, 10 G, 11 T`) and the remaining bits, shifted right by two,
//! are the unsigned quality. A byte of `0x00` is a no-call: the base becomes
//! `.` and the quality the Illumina masking value 2. Any called base whose
//! quality decodes to 0 or 1 is illegal by the format definition.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::GzDecoder;

use super::iter::BinaryFileIterator;
use crate::codec::LittleEndianReader;
use crate::error::{ReadError, Result};

/// Size of the BCL header in bytes
const HEADER_SIZE: usize = 4;

/// Base reported for a no-call byte
pub const NO_CALL_BASE: u8 = b'.';

/// Quality reported for a no-call byte, the Illumina masking value
pub const NO_CALL_QUALITY: u8 = 2;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// One decoded cluster: an ASCII base and its quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BclData {
    pub base: u8,
    pub quality: u8,
}

/// Decodes a single BCL body byte
///
/// # Errors
///
/// Fails with [`ReadError::InvalidQuality`] when a non-no-call byte carries a
/// quality below 2; those values are defined invalid by the format.
pub fn decode_basecall(byte: u8) -> Result<BclData> {
    if byte == 0 {
        return Ok(BclData {
            base: NO_CALL_BASE,
            quality: NO_CALL_QUALITY,
        });
    }
    let quality = byte >> 2;
    if quality < 2 {
        return Err(ReadError::InvalidQuality { byte, quality }.into());
    }
    Ok(BclData {
        base: BASES[usize::from(byte & 0x03)],
        quality,
    })
}

enum BclSource {
    /// Plain file, memory mapped with an exact size check at construction
    Mapped(BinaryFileIterator<u8>),
    /// Gzip stream; true size is unknown ahead of decompression
    Gzip(LittleEndianReader<BufReader<GzDecoder<File>>>),
}

/// A forward-only pull iterator over the clusters of one BCL file
///
/// For uncompressed inputs the body length is verified against the declared
/// cluster count before any record is read; a mismatch is fatal at
/// construction. Gzip-compressed inputs (`.gz`) skip this check.
pub struct BclReader {
    source: BclSource,
    num_clusters: u32,
    cluster_index: u32,
}

impl BclReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let is_gzip = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

        if is_gzip {
            let file = File::open(&path)?;
            let mut reader = LittleEndianReader::new(BufReader::new(GzDecoder::new(file)));
            let num_clusters = reader.read_u32()?;
            Ok(Self {
                source: BclSource::Gzip(reader),
                num_clusters,
                cluster_index: 0,
            })
        } else {
            let iter = BinaryFileIterator::new(HEADER_SIZE, &path)?;
            let num_clusters = LittleEndian::read_u32(iter.header_bytes());
            iter.assert_total_elements_equal(u64::from(num_clusters))?;
            Ok(Self {
                source: BclSource::Mapped(iter),
                num_clusters,
                cluster_index: 0,
            })
        }
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

    /// Decodes the next cluster
    ///
    /// # Errors
    ///
    /// Fails with [`ReadError::Exhausted`] past the declared cluster count,
    /// [`ReadError::UnexpectedEndOfStream`] on a truncated gzip body, or
    /// [`ReadError::InvalidQuality`] on an illegal byte value.
    pub fn next(&mut self) -> Result<BclData> {
        if !self.has_next() {
            return Err(ReadError::Exhausted.into());
        }
        let byte = match &mut self.source {
            BclSource::Mapped(iter) => iter.next_element()?,
            BclSource::Gzip(reader) => reader.read_u8()?,
        };
        self.cluster_index += 1;
        decode_basecall(byte)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn bcl_file(num_clusters: u32, body: &[u8]) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&num_clusters.to_le_bytes())?;
        file.write_all(body)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_decode_domain() {
        for v in 0..=u8::MAX {
            match decode_basecall(v) {
                Ok(data) => {
                    if v == 0 {
                        assert_eq!(data.base, b'.');
                        assert_eq!(data.quality, 2);
                    } else {
                        assert_ne!(data.base, b'.');
                        assert_eq!(data.quality, v >> 2);
                        assert!(data.quality >= 2);
                    }
                }
                Err(_) => {
                    // only called bases with quality 0 or 1 are illegal
                    assert_ne!(v, 0);
                    assert!(v >> 2 < 2);
                }
            }
        }
    }

    #[test]
    fn test_base_mapping() -> Result<()> {
        // quality 34 with each of the four base codes
        let quality = 34u8;
        let expected = [b'A', b'C', b'G', b'T'];
        for (code, base) in expected.iter().enumerate() {
            let byte = (quality << 2) | code as u8;
            let data = decode_basecall(byte)?;
            assert_eq!(data.base, *base);
            assert_eq!(data.quality, quality);
        }
        Ok(())
    }

    #[test]
    fn test_read_all_clusters() -> Result<()> {
        // 0x8B decodes to (T, 34) per the format worked example
        let file = bcl_file(3, &[0x8B, 0x00, 0x09])?;
        let mut reader = BclReader::new(file.path())?;
        assert_eq!(reader.num_clusters(), 3);

        let first = reader.next()?;
        assert_eq!((first.base, first.quality), (b'T', 34));
        let second = reader.next()?;
        assert_eq!((second.base, second.quality), (b'.', 2));
        let third = reader.next()?;
        assert_eq!((third.base, third.quality), (b'C', 2));

        assert!(!reader.has_next());
        assert!(reader.next().is_err());
        Ok(())
    }

    #[test]
    fn test_size_mismatch_fails_at_construction() -> Result<()> {
        // header declares 4 clusters but only 2 body bytes exist
        let file = bcl_file(4, &[0x8B, 0x8B])?;
        assert!(BclReader::new(file.path()).is_err());

        // trailing bytes beyond the declared count are just as fatal
        let file = bcl_file(1, &[0x8B, 0x8B])?;
        assert!(BclReader::new(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_gzip_skips_size_check() -> Result<()> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut file = tempfile::Builder::new().suffix(".bcl.gz").tempfile()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&2u32.to_le_bytes())?;
        encoder.write_all(&[0x8B, 0x00])?;
        file.write_all(&encoder.finish()?)?;
        file.flush()?;

        let mut reader = BclReader::new(file.path())?;
        assert_eq!(reader.num_clusters(), 2);
        assert_eq!(reader.next()?.base, b'T');
        assert_eq!(reader.next()?.base, b'.');
        assert!(!reader.has_next());
        Ok(())
    }

    #[test]
    fn test_truncated_gzip_body() -> Result<()> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut file = tempfile::Builder::new().suffix(".bcl.gz").tempfile()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&5u32.to_le_bytes())?;
        encoder.write_all(&[0x8B])?;
        file.write_all(&encoder.finish()?)?;
        file.flush()?;

        let mut reader = BclReader::new(file.path())?;
        assert_eq!(reader.next()?.base, b'T');
        let err = reader.next().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ReadError(ReadError::UnexpectedEndOfStream)
        ));
        Ok(())
    }
}
