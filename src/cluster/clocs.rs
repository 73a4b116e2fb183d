//! Clocs compressed position file reader
//!
//! Clocs files quantize cluster coordinates into a grid of 25x25-unit bins
//! covering a 2048-unit-wide tile image, 82 bins per row:
//!
//! ```text
//! Byte  0     : u8 reserved
//! Bytes 1-4   : u32 bin count
//! Bins        : u8 cluster count, then (u8 x, u8 y) per cluster
//! ```
//!
//! A stored byte is the coordinate in tenths relative to its bin's origin, so
//! a cluster decodes as `byte / 10.0 + bin_offset`. Bins run left to right,
//! top to bottom; empty bins still occupy their grid slot and shift the
//! offsets of every bin after them.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use super::filename::parse_position_filename;
use super::iter::BinaryFileIterator;
use super::PositionRecord;
use crate::error::{ReadError, Result};

const HEADER_SIZE: usize = 5;
const IMAGE_WIDTH: u32 = 2048;
const BLOCK_SIZE: u32 = 25;
const BINS_PER_ROW: u32 = IMAGE_WIDTH.div_ceil(BLOCK_SIZE);

/// A forward-only pull iterator over the cluster positions of one clocs file
///
/// Unlike the other position readers, exhaustion checking is fallible here:
/// the reader only learns the true cluster count by walking the bins, and a
/// file whose declared bins are all consumed while mapped bytes remain is
/// corrupt.
pub struct ClocsReader {
    iter: BinaryFileIterator<u8>,
    num_bins: u32,
    bins_started: u32,
    remaining_in_bin: u32,
    x_offset: f32,
    y_offset: f32,
    lane: i32,
    tile: i32,
}

impl ClocsReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let lane_tile = parse_position_filename(&path)?;
        let iter = BinaryFileIterator::new(HEADER_SIZE, path)?;
        let num_bins = LittleEndian::read_u32(&iter.header_bytes()[1..5]);

        Ok(Self {
            iter,
            num_bins,
            bins_started: 0,
            remaining_in_bin: 0,
            x_offset: 0.0,
            y_offset: 0.0,
            lane: lane_tile.lane,
            tile: lane_tile.tile,
        })
    }

    /// The bin count declared in the header
    #[must_use]
    pub fn num_bins(&self) -> u32 {
        self.num_bins
    }

    /// Skips forward over empty bins until a populated one is current
    fn advance_bin(&mut self) -> Result<()> {
        while self.remaining_in_bin == 0 && self.bins_started < self.num_bins {
            if self.bins_started > 0 {
                if self.bins_started % BINS_PER_ROW == 0 {
                    self.x_offset = 0.0;
                    self.y_offset += BLOCK_SIZE as f32;
                } else {
                    self.x_offset += BLOCK_SIZE as f32;
                }
            }
            self.remaining_in_bin = u32::from(self.iter.next_element()?);
            self.bins_started += 1;
        }
        Ok(())
    }

    /// Whether another cluster remains
    ///
    /// # Errors
    ///
    /// Fails with [`ReadError::TrailingData`] when every declared bin has
    /// been consumed but mapped bytes remain.
    pub fn has_next(&mut self) -> Result<bool> {
        self.advance_bin()?;
        if self.remaining_in_bin > 0 {
            return Ok(true);
        }
        if self.iter.remaining_bytes() > 0 {
            return Err(ReadError::TrailingData(self.num_bins).into());
        }
        Ok(false)
    }

    pub fn next(&mut self) -> Result<PositionRecord> {
        if !self.has_next()? {
            return Err(ReadError::Exhausted.into());
        }
        let x = self.iter.next_element()?;
        let y = self.iter.next_element()?;
        self.remaining_in_bin -= 1;
        Ok(PositionRecord {
            x: f32::from(x) / 10.0 + self.x_offset,
            y: f32::from(y) / 10.0 + self.y_offset,
            lane: self.lane,
            tile: self.tile,
        })
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Builds a clocs file where each entry of `bins` is one bin's clusters
    fn clocs_file(name: &str, bins: &[&[(u8, u8)]]) -> Result<(TempDir, PathBuf)> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(name);
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&(bins.len() as u32).to_le_bytes());
        for bin in bins {
            bytes.push(bin.len() as u8);
            for (x, y) in *bin {
                bytes.push(*x);
                bytes.push(*y);
            }
        }
        fs::write(&path, bytes)?;
        Ok((dir, path))
    }

    #[test]
    fn test_decode_first_bin() -> Result<()> {
        let (_dir, path) = clocs_file("s_1_1101.clocs", &[&[(10, 20), (30, 5)]])?;
        let mut reader = ClocsReader::new(&path)?;
        assert_eq!(reader.num_bins(), 1);

        let first = reader.next()?;
        assert_eq!((first.x, first.y), (1.0, 2.0));
        assert_eq!((first.lane, first.tile), (1, 1101));
        let second = reader.next()?;
        assert_eq!((second.x, second.y), (3.0, 0.5));

        assert!(!reader.has_next()?);
        Ok(())
    }

    #[test]
    fn test_empty_bins_shift_offsets() -> Result<()> {
        // bins 0 and 2 are empty; bin 1 sits 25 units right of the origin
        let (_dir, path) = clocs_file("s_1_1101.clocs", &[&[], &[(0, 10)], &[]])?;
        let mut reader = ClocsReader::new(&path)?;

        let only = reader.next()?;
        assert_eq!((only.x, only.y), (25.0, 1.0));
        assert!(!reader.has_next()?);
        Ok(())
    }

    #[test]
    fn test_row_wrap_after_82_bins() -> Result<()> {
        // bin 81 ends the first row; bin 82 starts the second
        let origin = [(0u8, 0u8)];
        let mut bins: Vec<&[(u8, u8)]> = vec![&[]; 81];
        bins.push(&origin);
        bins.push(&origin);
        let (_dir, path) = clocs_file("s_1_1101.clocs", &bins)?;
        let mut reader = ClocsReader::new(&path)?;

        let last_of_row = reader.next()?;
        assert_eq!((last_of_row.x, last_of_row.y), (81.0 * 25.0, 0.0));
        let first_of_next = reader.next()?;
        assert_eq!((first_of_next.x, first_of_next.y), (0.0, 25.0));
        Ok(())
    }

    #[test]
    fn test_trailing_data_detected() -> Result<()> {
        let (_dir, path) = clocs_file("s_1_1101.clocs", &[&[(10, 20)]])?;
        let mut bytes = fs::read(&path)?;
        bytes.push(0xFF);
        fs::write(&path, bytes)?;

        let mut reader = ClocsReader::new(&path)?;
        reader.next()?;
        let err = reader.has_next().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ReadError(ReadError::TrailingData(1))
        ));
        Ok(())
    }

    #[test]
    fn test_truncated_bin_body() -> Result<()> {
        // bin declares 2 clusters but only one pair of bytes follows
        let (_dir, path) = clocs_file("s_1_1101.clocs", &[&[(10, 20)]])?;
        let mut bytes = fs::read(&path)?;
        bytes[5] = 2;
        fs::write(&path, bytes)?;

        let mut reader = ClocsReader::new(&path)?;
        reader.next()?;
        assert!(reader.next().is_err());
        Ok(())
    }
}
