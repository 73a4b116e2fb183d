//! Dynamic index creation
//!
//! Rather than asking the caller to pick an indexing strategy up front, the
//! dynamic creator feeds every feature to one candidate of each strategy and
//! keeps whichever scores better once the stream is exhausted. The score is
//! an estimate of the features returned by a single-base query, so "better"
//! depends on what the caller wants: fewer features per query (seek time) or
//! more features per bin and therefore a smaller index file (size).

use std::path::Path;

use crate::error::{IndexError, Result};

use super::index::Index;
use super::interval::{IntervalIndexCreator, DEFAULT_FEATURES_PER_INTERVAL};
use super::linear_creator::{LinearConfig, LinearIndexCreator, DEFAULT_BIN_WIDTH};
use super::stats::RunningStat;

/// What the selected index should be balanced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBalanceApproach {
    /// Prefer the smallest index file
    ForSize,
    /// Prefer the fewest features returned per query
    ForSeekTime,
}

/// Floor on the seek-time linear bin width
const MIN_SEEK_BIN_WIDTH: u32 = 200;

/// Floor on the seek-time interval chunk size
const MIN_SEEK_FEATURES_PER_INTERVAL: u32 = 20;

enum Candidate {
    Linear(LinearIndexCreator),
    Interval(IntervalIndexCreator),
}

impl Candidate {
    /// Expected features returned by a single-base query
    fn score(&self, density: f64, longest_feature: u32) -> f64 {
        match self {
            Self::Linear(creator) => {
                let bin_width = f64::from(creator.bin_width());
                bin_width * density * (f64::from(longest_feature) / bin_width).ceil()
            }
            Self::Interval(creator) => f64::from(creator.features_per_interval()),
        }
    }

    fn add_feature(&mut self, chrom: &str, start: i32, end: i32, position: u64) -> Result<()> {
        match self {
            Self::Linear(creator) => creator.add_feature(chrom, start, end, position),
            Self::Interval(creator) => creator.add_feature(chrom, start, end, position),
        }
    }

    fn finalize(self, final_position: u64) -> Result<Index> {
        match self {
            Self::Linear(creator) => creator.finalize(final_position),
            Self::Interval(creator) => creator.finalize(final_position),
        }
    }
}

/// Builds one candidate index per strategy and keeps the better one
pub struct DynamicIndexCreator {
    approach: IndexBalanceApproach,
    candidates: Vec<Candidate>,
    stats: RunningStat,
    bases_seen: i64,
    feature_count: u64,
    longest_feature: u32,
    last_start: Option<i32>,
}

impl DynamicIndexCreator {
    pub fn new<P: AsRef<Path>>(indexed_file: P, approach: IndexBalanceApproach) -> Self {
        let (bin_width, features_per_interval) = match approach {
            IndexBalanceApproach::ForSize => (DEFAULT_BIN_WIDTH, DEFAULT_FEATURES_PER_INTERVAL),
            IndexBalanceApproach::ForSeekTime => (
                MIN_SEEK_BIN_WIDTH.max(DEFAULT_BIN_WIDTH / 4),
                MIN_SEEK_FEATURES_PER_INTERVAL.max(DEFAULT_FEATURES_PER_INTERVAL / 8),
            ),
        };
        let linear_config = LinearConfig {
            bin_width,
            ..LinearConfig::default()
        };
        let candidates = vec![
            Candidate::Linear(LinearIndexCreator::new(&indexed_file, linear_config)),
            Candidate::Interval(IntervalIndexCreator::new(
                &indexed_file,
                features_per_interval,
            )),
        ];
        Self {
            approach,
            candidates,
            stats: RunningStat::new(),
            bases_seen: 0,
            feature_count: 0,
            longest_feature: 0,
            last_start: None,
        }
    }

    /// Adds one feature to every candidate and the running statistics
    pub fn add_feature(&mut self, chrom: &str, start: i32, end: i32, position: u64) -> Result<()> {
        // density counts the span walked so far: the first feature and a
        // backwards start (a chromosome change in sorted input) contribute
        // their own start, every other feature its start delta
        self.bases_seen += match self.last_start {
            None => i64::from(start),
            Some(last_start) if start >= last_start => {
                i64::from(start) - i64::from(last_start)
            }
            Some(_) => i64::from(start),
        };
        self.longest_feature = self.longest_feature.max((end - start + 1) as u32);
        self.stats.push(f64::from(self.longest_feature));

        for candidate in &mut self.candidates {
            candidate.add_feature(chrom, start, end, position)?;
        }
        self.feature_count += 1;
        self.last_start = Some(start);
        Ok(())
    }

    /// Scores every candidate, finalizes the winner, and attaches the
    /// accumulated statistics as string properties
    pub fn finalize(mut self, final_position: u64) -> Result<Index> {
        let density = if self.bases_seen > 0 {
            self.feature_count as f64 / self.bases_seen as f64
        } else {
            0.0
        };

        let mut best: Option<(f64, usize)> = None;
        for (i, candidate) in self.candidates.iter().enumerate() {
            let score = candidate.score(density, self.longest_feature);
            let better = match best {
                None => true,
                Some((best_score, _)) => match self.approach {
                    IndexBalanceApproach::ForSeekTime => score < best_score,
                    IndexBalanceApproach::ForSize => score > best_score,
                },
            };
            if better {
                best = Some((score, i));
            }
        }
        let (_, winner) = best.ok_or(IndexError::NoCandidates)?;

        let mut index = self.candidates.swap_remove(winner).finalize(final_position)?;
        index.add_property("FEATURE_LENGTH_MEAN", &self.stats.mean().to_string());
        index.add_property("FEATURE_LENGTH_STD_DEV", &self.stats.std_dev().to_string());
        index.add_property("MEAN_FEATURE_VARIANCE", &self.stats.variance().to_string());
        index.add_property("FEATURE_COUNT", &self.feature_count.to_string());
        Ok(index)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;

    use crate::index::IndexKind;

    /// 100 short features spaced 10 apart on one chromosome
    fn feed(creator: &mut DynamicIndexCreator) -> Result<u64> {
        let mut offset = 0u64;
        for i in 0..100 {
            let start = 1 + i * 10;
            creator.add_feature("chr1", start, start + 4, offset)?;
            offset += 20;
        }
        Ok(offset)
    }

    #[test]
    fn test_seek_time_prefers_lower_score() -> Result<()> {
        let mut creator = DynamicIndexCreator::new("features.bed", IndexBalanceApproach::ForSeekTime);
        let final_position = feed(&mut creator)?;
        let index = creator.finalize(final_position)?;

        // linear candidate: 2000 * (100/991) * 1 = ~202; interval: 75
        assert_eq!(index.kind(), IndexKind::IntervalTree);
        Ok(())
    }

    #[test]
    fn test_size_prefers_higher_score() -> Result<()> {
        let mut creator = DynamicIndexCreator::new("features.bed", IndexBalanceApproach::ForSize);
        let final_position = feed(&mut creator)?;
        let index = creator.finalize(final_position)?;

        // linear candidate: 8000 * (100/991) * 1 = ~807; interval: 600
        assert_eq!(index.kind(), IndexKind::Linear);
        Ok(())
    }

    #[test]
    fn test_first_feature_counts_toward_density() -> Result<()> {
        // 100 features starting at 1_000_000: the first feature contributes
        // its own start, so the span is ~1_001_000 bases, not the ~990 the
        // deltas alone would give. Density drops accordingly and the linear
        // score (~0.8) loses to the interval candidate's 600.
        let mut creator = DynamicIndexCreator::new("features.bed", IndexBalanceApproach::ForSize);
        let mut offset = 0u64;
        for i in 0..100 {
            let start = 1_000_000 + i * 10;
            creator.add_feature("chr1", start, start + 4, offset)?;
            offset += 20;
        }
        let index = creator.finalize(offset)?;
        assert_eq!(index.kind(), IndexKind::IntervalTree);
        Ok(())
    }

    #[test]
    fn test_chromosome_restart_counts_its_own_start() -> Result<()> {
        // spread the same 100 features across two chromosomes; the restart
        // adds chr2's first start (1_000_000) rather than a negative delta,
        // keeping the density low enough that the interval candidate wins
        let mut creator = DynamicIndexCreator::new("features.bed", IndexBalanceApproach::ForSize);
        let mut offset = 0u64;
        for chrom in ["chr1", "chr2"] {
            for i in 0..50 {
                let start = 1_000_000 + i * 10;
                creator.add_feature(chrom, start, start + 4, offset)?;
                offset += 20;
            }
        }
        let index = creator.finalize(offset)?;
        assert_eq!(index.kind(), IndexKind::IntervalTree);
        Ok(())
    }

    #[test]
    fn test_statistics_attached_as_properties() -> Result<()> {
        let mut creator = DynamicIndexCreator::new("features.bed", IndexBalanceApproach::ForSize);
        let final_position = feed(&mut creator)?;
        let index = creator.finalize(final_position)?;

        let properties = index.properties();
        let get = |key: &str| {
            properties
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("FEATURE_COUNT"), Some("100"));
        // every feature has length 5, so the running-longest stream is flat
        assert_eq!(get("FEATURE_LENGTH_MEAN"), Some("5"));
        assert_eq!(get("FEATURE_LENGTH_STD_DEV"), Some("0"));
        assert_eq!(get("MEAN_FEATURE_VARIANCE"), Some("0"));
        Ok(())
    }

    #[test]
    fn test_queries_work_through_the_selected_index() -> Result<()> {
        let mut creator = DynamicIndexCreator::new("features.bed", IndexBalanceApproach::ForSeekTime);
        let final_position = feed(&mut creator)?;
        let index = creator.finalize(final_position)?;

        let blocks = index.get_blocks("chr1", 1, 50)?;
        assert!(!blocks.is_empty());
        assert!(index.get_blocks("chrX", 1, 50).is_err());
        Ok(())
    }
}
