//! Feature index container and on-disk format
//!
//! An [`Index`] wraps one indexing strategy's per-chromosome records together
//! with metadata about the file that was indexed. The binary layout is
//! little-endian throughout:
//!
//! ```text
//! magic u32 ('TIDX') | type u32 | version u32 | indexed file path cstr |
//! indexed file size u64 | indexed file timestamp u64 | md5 cstr |
//! flags u32 | property count u32 | (key cstr, value cstr)* |
//! chromosome count u32 | per-chromosome records
//! ```
//!
//! Unset size/timestamp fields are stored as `u64::MAX`.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::codec::{LittleEndianReader, LittleEndianWriter};
use crate::error::{HeaderError, IndexError, Result};

use super::block::Block;
use super::interval::IntervalChrIndex;
use super::linear::ChrIndex;

/// The index magic number, the bytes `TIDX` read as a little-endian u32
pub const MAGIC: u32 = 0x5844_4954;

/// The single supported index format version
pub const VERSION: u32 = 3;

/// Sentinel for a size/timestamp that was never recorded
const UNSET: u64 = u64::MAX;

/// The indexing strategy tag stored in the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Linear,
    IntervalTree,
}

impl IndexKind {
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Linear => 1,
            Self::IntervalTree => 2,
        }
    }

    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::Linear),
            2 => Ok(Self::IntervalTree),
            other => Err(HeaderError::InvalidIndexType(other).into()),
        }
    }
}

/// Per-chromosome records, tagged by indexing strategy
#[derive(Debug, Clone, PartialEq)]
pub enum IndexData {
    Linear(Vec<ChrIndex>),
    Interval(Vec<IntervalChrIndex>),
}

impl IndexData {
    #[must_use]
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::Linear(_) => IndexKind::Linear,
            Self::Interval(_) => IndexKind::IntervalTree,
        }
    }

    fn chromosome_count(&self) -> usize {
        match self {
            Self::Linear(chrs) => chrs.len(),
            Self::Interval(chrs) => chrs.len(),
        }
    }
}

/// A complete feature file index
///
/// Chromosomes and properties preserve first-seen order. The index owns all
/// of its per-chromosome data exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    version: u32,
    indexed_file: PathBuf,
    indexed_file_size: u64,
    indexed_file_ts: u64,
    indexed_file_md5: String,
    flags: u32,
    properties: Vec<(String, String)>,
    data: IndexData,
}

impl Index {
    #[must_use]
    pub fn new<P: AsRef<Path>>(indexed_file: P, data: IndexData) -> Self {
        Self {
            version: VERSION,
            indexed_file: indexed_file.as_ref().to_path_buf(),
            indexed_file_size: UNSET,
            indexed_file_ts: UNSET,
            indexed_file_md5: String::new(),
            flags: 0,
            properties: Vec::new(),
            data,
        }
    }

    #[must_use]
    pub fn kind(&self) -> IndexKind {
        self.data.kind()
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn is_current_version(&self) -> bool {
        self.version == VERSION
    }

    #[must_use]
    pub fn indexed_file(&self) -> &Path {
        &self.indexed_file
    }

    #[must_use]
    pub fn data(&self) -> &IndexData {
        &self.data
    }

    /// Key/value properties in insertion order
    #[must_use]
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    pub fn add_property(&mut self, key: &str, value: &str) {
        self.properties.push((key.to_string(), value.to_string()));
    }

    /// Chromosome names in first-seen order
    #[must_use]
    pub fn sequence_names(&self) -> Vec<&str> {
        match &self.data {
            IndexData::Linear(chrs) => chrs.iter().map(ChrIndex::name).collect(),
            IndexData::Interval(chrs) => chrs.iter().map(IntervalChrIndex::name).collect(),
        }
    }

    #[must_use]
    pub fn contains_chromosome(&self, name: &str) -> bool {
        self.sequence_names().iter().any(|n| *n == name)
    }

    /// Returns the byte ranges holding features overlapping `[start, end]`
    /// on `chromosome` (1-based inclusive coordinates)
    ///
    /// # Errors
    ///
    /// Fails with [`IndexError::UnknownContig`] for a chromosome absent from
    /// the index; a known chromosome with no overlapping data returns an
    /// empty list instead.
    pub fn get_blocks(&self, chromosome: &str, start: i32, end: i32) -> Result<Vec<Block>> {
        match &self.data {
            IndexData::Linear(chrs) => chrs
                .iter()
                .find(|chr| chr.name() == chromosome)
                .map(|chr| chr.get_blocks(start, end)),
            IndexData::Interval(chrs) => chrs
                .iter()
                .find(|chr| chr.name() == chromosome)
                .map(|chr| chr.get_blocks(start, end)),
        }
        .ok_or_else(|| IndexError::UnknownContig(chromosome.to_string()).into())
    }

    /// Records the indexed file's current size and modification time
    ///
    /// Called once, after the build finishes and before serialization. A
    /// missing indexed file leaves the fields unset.
    pub fn finalize(&mut self) {
        if let Ok(metadata) = fs::metadata(&self.indexed_file) {
            self.indexed_file_size = metadata.len();
            if let Ok(modified) = metadata.modified() {
                if let Ok(since_epoch) = modified.duration_since(UNIX_EPOCH) {
                    self.indexed_file_ts = since_epoch.as_millis() as u64;
                }
            }
        }
    }

    /// Serializes the whole index, returning the number of bytes written
    pub fn write<W: Write>(&self, writer: W) -> Result<u64> {
        let mut writer = LittleEndianWriter::new(writer);
        writer.write_u32(MAGIC)?;
        writer.write_u32(self.kind().as_u32())?;
        writer.write_u32(self.version)?;
        writer.write_string(&self.indexed_file.to_string_lossy())?;
        writer.write_u64(self.indexed_file_size)?;
        writer.write_u64(self.indexed_file_ts)?;
        writer.write_string(&self.indexed_file_md5)?;
        writer.write_u32(self.flags)?;

        writer.write_u32(self.properties.len() as u32)?;
        for (key, value) in &self.properties {
            writer.write_string(key)?;
            writer.write_string(value)?;
        }

        writer.write_u32(self.data.chromosome_count() as u32)?;
        match &self.data {
            IndexData::Linear(chrs) => {
                for chr in chrs {
                    chr.write(&mut writer)?;
                }
            }
            IndexData::Interval(chrs) => {
                for chr in chrs {
                    chr.write(&mut writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(writer.bytes_written())
    }

    /// Deserializes a whole index
    ///
    /// # Errors
    ///
    /// Fails with [`HeaderError::InvalidMagicNumber`] or
    /// [`HeaderError::InvalidIndexType`] on an unrecognized header. The
    /// version field is stored as found; check [`Index::is_current_version`].
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let mut reader = LittleEndianReader::new(reader);
        let magic = reader.read_u32()?;
        if magic != MAGIC {
            return Err(HeaderError::InvalidMagicNumber(magic).into());
        }
        let kind = IndexKind::from_u32(reader.read_u32()?)?;
        let version = reader.read_u32()?;
        let indexed_file = PathBuf::from(reader.read_string()?);
        let indexed_file_size = reader.read_u64()?;
        let indexed_file_ts = reader.read_u64()?;
        let indexed_file_md5 = reader.read_string()?;
        let flags = reader.read_u32()?;

        let property_count = reader.read_u32()?;
        let mut properties = Vec::with_capacity(property_count as usize);
        for _ in 0..property_count {
            let key = reader.read_string()?;
            let value = reader.read_string()?;
            properties.push((key, value));
        }

        let chromosome_count = reader.read_u32()?;
        let data = match kind {
            IndexKind::Linear => {
                let mut chrs = Vec::with_capacity(chromosome_count as usize);
                for _ in 0..chromosome_count {
                    chrs.push(ChrIndex::read(&mut reader)?);
                }
                IndexData::Linear(chrs)
            }
            IndexKind::IntervalTree => {
                let mut chrs = Vec::with_capacity(chromosome_count as usize);
                for _ in 0..chromosome_count {
                    chrs.push(IntervalChrIndex::read(&mut reader)?);
                }
                IndexData::Interval(chrs)
            }
        };

        Ok(Self {
            version,
            indexed_file,
            indexed_file_size,
            indexed_file_ts,
            indexed_file_md5,
            flags,
            properties,
            data,
        })
    }
}
