//! Text position file reader
//!
//! The oldest Illumina position format is plain text: one cluster per line,
//! two whitespace-separated decimal coordinates, no header. Files follow the
//! `s_<lane>_<tile>_pos.txt[.gz]` naming convention.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use flate2::read::GzDecoder;

use super::filename::parse_position_filename;
use super::PositionRecord;
use crate::error::{ReadError, Result};

/// A forward-only pull iterator over the cluster positions of one pos.txt file
///
/// The record count is unknown ahead of time, so exhaustion is discovered by
/// reading: `next` after the last line fails with [`ReadError::Exhausted`].
pub struct PosReader {
    lines: Lines<BufReader<Box<dyn std::io::Read>>>,
    pending: Option<String>,
    lane: i32,
    tile: i32,
}

impl PosReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let lane_tile = parse_position_filename(&path)?;
        let is_gzip = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

        let file = File::open(&path)?;
        let source: Box<dyn std::io::Read> = if is_gzip {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Ok(Self {
            lines: BufReader::new(source).lines(),
            pending: None,
            lane: lane_tile.lane,
            tile: lane_tile.tile,
        })
    }

    /// Whether another position line remains
    ///
    /// Reads ahead one line; blank lines at the end of the file do not count.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        for line in self.lines.by_ref() {
            let line = line?;
            if !line.trim().is_empty() {
                self.pending = Some(line);
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn next(&mut self) -> Result<PositionRecord> {
        if !self.has_next()? {
            return Err(ReadError::Exhausted.into());
        }
        let line = self.pending.take().unwrap_or_default();
        let mut fields = line.split_whitespace();
        let x = fields.next().and_then(|f| f.parse::<f32>().ok());
        let y = fields.next().and_then(|f| f.parse::<f32>().ok());
        match (x, y, fields.next()) {
            (Some(x), Some(y), None) => Ok(PositionRecord {
                x,
                y,
                lane: self.lane,
                tile: self.tile,
            }),
            _ => Err(ReadError::MalformedPositionLine(line).into()),
        }
    }
}
