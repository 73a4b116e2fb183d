//! Locs position file reader
//!
//! Locs files store cluster coordinates as consecutive float pairs:
//!
//! ```text
//! Bytes 0-3   : i32, must equal 1
//! Bytes 4-7   : f32, must equal 1.0
//! Bytes 8-11  : u32 cluster count
//! Bytes 12..  : f32 x, f32 y per cluster
//! ```
//!
//! Lane and tile come from the `s_<lane>_<tile>.locs` file name.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use super::filename::parse_position_filename;
use super::iter::BinaryFileIterator;
use super::PositionRecord;
use crate::error::{HeaderError, ReadError, Result};

const HEADER_SIZE: usize = 12;

/// A forward-only pull iterator over the cluster positions of one locs file
#[derive(Debug)]
pub struct LocsReader {
    iter: BinaryFileIterator<f32>,
    num_clusters: u32,
    cluster_index: u32,
    lane: i32,
    tile: i32,
}

impl LocsReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let lane_tile = parse_position_filename(&path)?;
        let iter = BinaryFileIterator::new(HEADER_SIZE, path)?;
        let header = iter.header_bytes();

        let field_one = LittleEndian::read_i32(&header[0..4]);
        if field_one != 1 {
            return Err(HeaderError::InvalidHeaderField {
                field: "locs constant",
                found: field_one.to_string(),
            }
            .into());
        }
        let field_two = LittleEndian::read_f32(&header[4..8]);
        if field_two != 1.0 {
            return Err(HeaderError::InvalidHeaderField {
                field: "locs version",
                found: field_two.to_string(),
            }
            .into());
        }
        let num_clusters = LittleEndian::read_u32(&header[8..12]);
        iter.assert_total_elements_equal(2 * u64::from(num_clusters))?;

        Ok(Self {
            iter,
            num_clusters,
            cluster_index: 0,
            lane: lane_tile.lane,
            tile: lane_tile.tile,
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

    pub fn next(&mut self) -> Result<PositionRecord> {
        if !self.has_next() {
            return Err(ReadError::Exhausted.into());
        }
        let x = self.iter.next_element()?;
        let y = self.iter.next_element()?;
        self.cluster_index += 1;
        Ok(PositionRecord {
            x,
            y,
            lane: self.lane,
            tile: self.tile,
        })
    }
}
