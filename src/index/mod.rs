//! Feature file indices
//!
//! Building blocks for indexing sorted genomic feature files so a region
//! query maps to a small set of byte ranges instead of a full scan. Two
//! strategies are provided: fixed-bin-width linear indices and
//! fixed-feature-count interval indices, plus a dynamic creator that builds
//! both and keeps whichever scores better for the caller's preference.
//!
//! Construction is a single forward pass over `(chromosome, start, end,
//! file_offset)` tuples. The input must be coordinate sorted, with each
//! chromosome's features contiguous; violations are fatal, since a broken
//! invariant here would silently produce wrong query results later.

#[allow(clippy::module_inception)]
mod index;

pub mod block;
pub mod dynamic;
pub mod interval;
pub mod linear;
pub mod linear_creator;
pub mod stats;

pub use block::Block;
pub use dynamic::{DynamicIndexCreator, IndexBalanceApproach};
pub use index::{Index, IndexData, IndexKind, MAGIC, VERSION};
pub use interval::{Interval, IntervalChrIndex, IntervalIndexCreator};
pub use linear::ChrIndex;
pub use linear_creator::{LinearConfig, LinearIndexCreator};
pub use stats::RunningStat;

use std::collections::HashSet;

use crate::error::{IndexError, Result};

/// Enforces the sorted, contiguous-per-chromosome input contract shared by
/// every index creator
#[derive(Debug, Default)]
pub(crate) struct ContigGuard {
    current: Option<(String, i32)>,
    closed: HashSet<String>,
}

impl ContigGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Checks one feature against the contract; `Ok(true)` means `chrom`
    /// starts a new chromosome
    pub(crate) fn observe(&mut self, chrom: &str, start: i32) -> Result<bool> {
        match &mut self.current {
            Some((name, last_start)) if name == chrom => {
                if start < *last_start {
                    return Err(IndexError::UnsortedInput {
                        chrom: chrom.to_string(),
                        start,
                        last_start: *last_start,
                    }
                    .into());
                }
                *last_start = start;
                Ok(false)
            }
            _ => {
                if self.closed.contains(chrom) {
                    return Err(IndexError::DiscontinuousContig(chrom.to_string()).into());
                }
                if let Some((name, _)) = self.current.take() {
                    self.closed.insert(name);
                }
                self.current = Some((chrom.to_string(), start));
                Ok(true)
            }
        }
    }
}
