//! Interval per-chromosome indices
//!
//! Where a linear index cuts coordinate space into fixed-width bins, an
//! interval index cuts the feature stream into chunks of a fixed feature
//! count. Each chunk becomes one interval spanning the coordinates it saw
//! and the byte range it occupies, so every interval resolves to roughly the
//! same number of features regardless of density.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::codec::{LittleEndianReader, LittleEndianWriter};
use crate::error::Result;

use super::block::Block;
use super::index::{Index, IndexData};
use super::ContigGuard;

/// Default number of features grouped into one interval
pub const DEFAULT_FEATURES_PER_INTERVAL: u32 = 600;

/// One chunk of consecutive features: its coordinate span and byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: i32,
    pub end: i32,
    pub block: Block,
}

impl Interval {
    #[must_use]
    pub fn overlaps(&self, start: i32, end: i32) -> bool {
        self.start <= end && self.end >= start
    }
}

/// The interval index of a single chromosome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalChrIndex {
    name: String,
    intervals: Vec<Interval>,
}

impl IntervalChrIndex {
    #[must_use]
    pub fn new(name: String, intervals: Vec<Interval>) -> Self {
        Self { name, intervals }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Returns the blocks of every interval overlapping `[start, end]`
    ///
    /// Coordinates are 1-based inclusive. Unlike the linear case the blocks
    /// are not merged: consecutive intervals are contiguous on disk but the
    /// caller may want per-interval granularity.
    #[must_use]
    pub fn get_blocks(&self, start: i32, end: i32) -> Vec<Block> {
        self.intervals
            .iter()
            .filter(|interval| interval.overlaps(start, end))
            .map(|interval| interval.block)
            .collect()
    }

    pub fn write<W: Write>(&self, writer: &mut LittleEndianWriter<W>) -> Result<()> {
        writer.write_string(&self.name)?;
        writer.write_u32(self.intervals.len() as u32)?;
        for interval in &self.intervals {
            writer.write_i32(interval.start)?;
            writer.write_i32(interval.end)?;
            writer.write_u64(interval.block.start_position())?;
            writer.write_u64(interval.block.size())?;
        }
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut LittleEndianReader<R>) -> Result<Self> {
        let name = reader.read_string()?;
        let interval_count = reader.read_u32()?;
        let mut intervals = Vec::with_capacity(interval_count as usize);
        for _ in 0..interval_count {
            let start = reader.read_i32()?;
            let end = reader.read_i32()?;
            let block_start = reader.read_u64()?;
            let block_size = reader.read_u64()?;
            intervals.push(Interval {
                start,
                end,
                block: Block::new(block_start, block_size),
            });
        }
        Ok(Self { name, intervals })
    }
}

/// A chunk mid-accumulation: the block end is unknown until the next chunk
/// begins or finalize supplies it
struct OpenChunk {
    start: i32,
    max_end: i32,
    block_start: u64,
    count: u32,
}

struct OpenChr {
    name: String,
    intervals: Vec<Interval>,
    chunk: Option<OpenChunk>,
}

impl OpenChr {
    fn cut_chunk(&mut self, position: u64) {
        if let Some(chunk) = self.chunk.take() {
            self.intervals.push(Interval {
                start: chunk.start,
                end: chunk.max_end,
                block: Block::new(chunk.block_start, position - chunk.block_start),
            });
        }
    }

    fn close(mut self, position: u64) -> IntervalChrIndex {
        self.cut_chunk(position);
        IntervalChrIndex::new(self.name, self.intervals)
    }
}

/// Builds an interval [`Index`] from one sorted pass over a feature stream
pub struct IntervalIndexCreator {
    indexed_file: PathBuf,
    features_per_interval: u32,
    guard: ContigGuard,
    open: Option<OpenChr>,
    closed: Vec<IntervalChrIndex>,
}

impl IntervalIndexCreator {
    pub fn new<P: AsRef<Path>>(indexed_file: P, features_per_interval: u32) -> Self {
        Self {
            indexed_file: indexed_file.as_ref().to_path_buf(),
            features_per_interval,
            guard: ContigGuard::new(),
            open: None,
            closed: Vec::new(),
        }
    }

    /// The configured chunk size
    #[must_use]
    pub fn features_per_interval(&self) -> u32 {
        self.features_per_interval
    }

    /// Adds one feature; `position` is its byte offset in the indexed file
    ///
    /// Enforces the same sorted, contiguous-per-chromosome contract as the
    /// linear creator.
    pub fn add_feature(&mut self, chrom: &str, start: i32, end: i32, position: u64) -> Result<()> {
        if self.guard.observe(chrom, start)? {
            if let Some(open) = self.open.take() {
                self.closed.push(open.close(position));
            }
            self.open = Some(OpenChr {
                name: chrom.to_string(),
                intervals: Vec::new(),
                chunk: None,
            });
        }

        if let Some(open) = self.open.as_mut() {
            let full = open
                .chunk
                .as_ref()
                .is_some_and(|chunk| chunk.count >= self.features_per_interval);
            if full {
                open.cut_chunk(position);
            }
            let chunk = open.chunk.get_or_insert(OpenChunk {
                start,
                max_end: end,
                block_start: position,
                count: 0,
            });
            chunk.max_end = chunk.max_end.max(end);
            chunk.count += 1;
        }
        Ok(())
    }

    /// Closes the last chunk and chromosome at `final_position` and wraps
    /// everything into a finalized [`Index`]
    pub fn finalize(mut self, final_position: u64) -> Result<Index> {
        if let Some(open) = self.open.take() {
            self.closed.push(open.close(final_position));
        }
        let mut index = Index::new(self.indexed_file, IndexData::Interval(self.closed));
        index.finalize();
        Ok(index)
    }
}
