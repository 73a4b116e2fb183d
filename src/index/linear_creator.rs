//! Linear index construction
//!
//! Builds a [`ChrIndex`] per chromosome in one forward pass over a sorted
//! feature stream, then optionally optimizes bin widths per chromosome so a
//! query returns a bounded number of features without inflating the index
//! file for sparse chromosomes.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::block::Block;
use super::index::{Index, IndexData};
use super::linear::ChrIndex;
use super::ContigGuard;

/// Default coordinate width of one bin
pub const DEFAULT_BIN_WIDTH: u32 = 8_000;

/// Tuning knobs for linear index construction
///
/// All are explicit per-builder configuration; nothing is read from ambient
/// global state.
#[derive(Debug, Clone)]
pub struct LinearConfig {
    /// Coordinate width of one bin before optimization
    pub bin_width: u32,
    /// Optimize keeps merging bins while the densest would still hold at
    /// most this many features (assuming uniform feature size); denser
    /// chromosomes are left as built
    pub max_features_per_bin: f64,
    /// Absolute cap on an optimized bin width
    pub max_bin_width: u32,
    /// Cap on the optimized bin width of chromosomes holding more than one
    /// feature
    pub max_occupied_bin_width: u32,
    /// Whether finalize runs the optimize pass at all
    pub adaptive: bool,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            bin_width: DEFAULT_BIN_WIDTH,
            max_features_per_bin: 100.0,
            max_bin_width: 1_000_000_000,
            max_occupied_bin_width: 1_024_000,
            adaptive: true,
        }
    }
}

/// A chromosome mid-build: block ends are unknown until the next feature or
/// finalize supplies them
struct OpenChr {
    name: String,
    longest_feature: u32,
    n_features: u32,
    blocks: Vec<Block>,
}

impl OpenChr {
    fn open(name: &str, position: u64) -> Self {
        Self {
            name: name.to_string(),
            longest_feature: 0,
            n_features: 0,
            blocks: vec![Block::new(position, 0)],
        }
    }

    /// Assigns every pending block its end: block *i* ends where block *i+1*
    /// starts, the last block at `position`
    fn close(mut self, position: u64, bin_width: u32) -> ChrIndex {
        for i in 0..self.blocks.len() - 1 {
            let next_start = self.blocks[i + 1].start_position();
            self.blocks[i].set_end_position(next_start);
        }
        if let Some(last) = self.blocks.last_mut() {
            last.set_end_position(position);
        }
        ChrIndex::new(
            self.name,
            bin_width,
            self.longest_feature,
            self.n_features,
            self.blocks,
        )
    }
}

/// Builds a linear [`Index`] from one sorted pass over a feature stream
pub struct LinearIndexCreator {
    indexed_file: PathBuf,
    config: LinearConfig,
    guard: ContigGuard,
    open: Option<OpenChr>,
    closed: Vec<ChrIndex>,
}

impl LinearIndexCreator {
    pub fn new<P: AsRef<Path>>(indexed_file: P, config: LinearConfig) -> Self {
        Self {
            indexed_file: indexed_file.as_ref().to_path_buf(),
            config,
            guard: ContigGuard::new(),
            open: None,
            closed: Vec::new(),
        }
    }

    /// The configured pre-optimization bin width
    #[must_use]
    pub fn bin_width(&self) -> u32 {
        self.config.bin_width
    }

    /// Adds one feature; `position` is its byte offset in the indexed file
    ///
    /// # Errors
    ///
    /// Fails with [`crate::IndexError::UnsortedInput`] when `start` goes
    /// backwards on the current chromosome and with
    /// [`crate::IndexError::DiscontinuousContig`] when a chromosome
    /// reappears after being left.
    pub fn add_feature(&mut self, chrom: &str, start: i32, end: i32, position: u64) -> Result<()> {
        if self.guard.observe(chrom, start)? {
            if let Some(open) = self.open.take() {
                self.closed
                    .push(open.close(position, self.config.bin_width));
            }
            self.open = Some(OpenChr::open(chrom, position));
        }

        if let Some(open) = self.open.as_mut() {
            // bins skipped by a sparse feature get zero-size placeholder
            // blocks at the current offset
            while i64::from(start)
                > open.blocks.len() as i64 * i64::from(self.config.bin_width)
            {
                open.blocks.push(Block::new(position, 0));
            }
            open.longest_feature = open.longest_feature.max((end - start + 1) as u32);
            open.n_features += 1;
        }
        Ok(())
    }

    /// Closes the last chromosome at `final_position`, optimizes, and wraps
    /// everything into a finalized [`Index`]
    pub fn finalize(mut self, final_position: u64) -> Result<Index> {
        if let Some(open) = self.open.take() {
            self.closed
                .push(open.close(final_position, self.config.bin_width));
        }
        if self.config.adaptive {
            for chr in &mut self.closed {
                chr.optimize(self.config.max_features_per_bin, &self.config)?;
            }
        }
        let mut index = Index::new(self.indexed_file, IndexData::Linear(self.closed));
        index.finalize();
        Ok(index)
    }
}
