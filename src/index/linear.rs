//! Linear per-chromosome indices
//!
//! A linear index divides a chromosome's coordinate space into fixed-width
//! bins and maps each bin to the byte range of the feature file holding the
//! features that start there. Blocks are contiguous and gapless, so any
//! query resolves to at most one merged byte range.

use std::io::{Read, Write};

use crate::codec::{LittleEndianReader, LittleEndianWriter};
use crate::error::{IndexError, Result};

use super::block::Block;
use super::LinearConfig;

/// Hard cap on optimize passes; each pass doubles the bin width, so hitting
/// this means the width checks failed to stop the loop.
const MAX_MERGE_PASSES: u32 = 30;

/// The linear index of a single chromosome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChrIndex {
    name: String,
    bin_width: u32,
    longest_feature: u32,
    n_features: u32,
    blocks: Vec<Block>,
}

impl ChrIndex {
    #[must_use]
    pub fn new(
        name: String,
        bin_width: u32,
        longest_feature: u32,
        n_features: u32,
        blocks: Vec<Block>,
    ) -> Self {
        Self {
            name,
            bin_width,
            longest_feature,
            n_features,
            blocks,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bin_width(&self) -> u32 {
        self.bin_width
    }

    #[must_use]
    pub fn longest_feature(&self) -> u32 {
        self.longest_feature
    }

    #[must_use]
    pub fn n_features(&self) -> u32 {
        self.n_features
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the byte range holding features overlapping `[start, end]`
    ///
    /// Coordinates are 1-based inclusive. The start is pulled left by the
    /// longest feature on the chromosome so features beginning before the
    /// window but extending into it are never missed. Adjacent bins merge
    /// into one block since linear blocks are physically contiguous.
    ///
    /// A query past the indexed range of a known chromosome returns an empty
    /// list; callers cannot distinguish that from "no data here".
    #[must_use]
    pub fn get_blocks(&self, start: i32, end: i32) -> Vec<Block> {
        if self.blocks.is_empty() {
            return Vec::new();
        }
        let adjusted_start = (start - self.longest_feature as i32).max(0);
        let start_bin = (adjusted_start / self.bin_width as i32) as usize;
        if start_bin >= self.blocks.len() {
            return Vec::new();
        }
        let end_bin = (((end - 1).max(0) / self.bin_width as i32) as usize)
            .min(self.blocks.len() - 1);

        let merged_start = self.blocks[start_bin].start_position();
        let merged_size = self.blocks[end_bin].end_position() - merged_start;
        if merged_size == 0 {
            Vec::new()
        } else {
            vec![Block::new(merged_start, merged_size)]
        }
    }

    /// Expected features in the densest block, assuming uniform feature size
    fn optimize_score(&self) -> f64 {
        if self.n_features == 0 || self.blocks.is_empty() {
            return 0.0;
        }
        let total_bytes = self.blocks[self.blocks.len() - 1].end_position()
            - self.blocks[0].start_position();
        if total_bytes == 0 {
            return 0.0;
        }
        let average_feature_size = total_bytes as f64 / f64::from(self.n_features);
        let largest_block = self
            .blocks
            .iter()
            .map(Block::size)
            .max()
            .unwrap_or(0);
        largest_block as f64 / average_feature_size
    }

    /// Whether this index's bins have grown uselessly wide
    fn bad_bin_width(&self, config: &LinearConfig) -> bool {
        self.bin_width > config.max_bin_width
            || (self.n_features > 1 && self.bin_width > config.max_occupied_bin_width)
    }

    /// Collapses adjacent block pairs into one, doubling the bin width
    fn merge_blocks(&mut self, doubled_width: u32) {
        let mut merged = Vec::with_capacity(self.blocks.len().div_ceil(2));
        for pair in self.blocks.chunks(2) {
            let start = pair[0].start_position();
            let end = pair[pair.len() - 1].end_position();
            merged.push(Block::new(start, end - start));
        }
        self.blocks = merged;
        self.bin_width = doubled_width;
    }

    /// Coarsens sparse chromosomes by merging adjacent block pairs while the
    /// density score stays at or below `threshold`
    ///
    /// Dense chromosomes, whose score already exceeds the threshold, are
    /// left untouched so per-query result sets stay bounded; sparse ones
    /// merge toward fewer, larger blocks to shrink the index file. A merge
    /// candidate is kept only if it still passes every check, so the result
    /// is never a single collapsed block (unless it started as one) and
    /// never exceeds the bin width caps. Each accepted merge exactly
    /// doubles `bin_width` and halves the block count (rounding up).
    pub fn optimize(&mut self, threshold: f64, config: &LinearConfig) -> Result<()> {
        let mut candidate = self.clone();
        let mut passes = 0u32;
        loop {
            if candidate.optimize_score() > threshold
                || candidate.blocks.len() == 1
                || candidate.bad_bin_width(config)
            {
                break;
            }
            if passes >= MAX_MERGE_PASSES {
                return Err(IndexError::TooManyMergePasses(self.name.clone()).into());
            }
            // candidate passed every check: remember it, then try merging
            // one step further
            self.clone_from(&candidate);
            let Some(doubled) = candidate.bin_width.checked_mul(2) else {
                break;
            };
            candidate.merge_blocks(doubled);
            passes += 1;
        }
        Ok(())
    }

    /// Serializes this chromosome's index record
    ///
    /// Blocks are written as `block_count + 1` monotonic u64 offsets; the
    /// extra offset is the last block's end, so contiguous blocks round-trip
    /// exactly.
    pub fn write<W: Write>(&self, writer: &mut LittleEndianWriter<W>) -> Result<()> {
        writer.write_string(&self.name)?;
        writer.write_u32(self.bin_width)?;
        writer.write_u32(self.blocks.len() as u32)?;
        writer.write_u32(self.longest_feature)?;
        writer.write_u32(0)?; // reserved
        writer.write_u32(self.n_features)?;
        for block in &self.blocks {
            writer.write_u64(block.start_position())?;
        }
        let final_offset = self
            .blocks
            .last()
            .map_or(0, Block::end_position);
        writer.write_u64(final_offset)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut LittleEndianReader<R>) -> Result<Self> {
        let name = reader.read_string()?;
        let bin_width = reader.read_u32()?;
        let block_count = reader.read_u32()?;
        let longest_feature = reader.read_u32()?;
        let _reserved = reader.read_u32()?;
        let n_features = reader.read_u32()?;

        let mut offsets = Vec::with_capacity(block_count as usize + 1);
        for _ in 0..=block_count {
            offsets.push(reader.read_u64()?);
        }
        let blocks = offsets
            .windows(2)
            .map(|pair| Block::new(pair[0], pair[1] - pair[0]))
            .collect();

        Ok(Self {
            name,
            bin_width,
            longest_feature,
            n_features,
            blocks,
        })
    }
}
