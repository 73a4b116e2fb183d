//! Position file naming convention
//!
//! Illumina position files carry their lane and tile numbers in the file name
//! rather than in a header, following the pattern
//! `s_<lane>_<tile>{_pos.txt|.locs|.clocs}[.gz|.bz2]`. A name outside this
//! pattern is fatal at reader construction.

use std::path::Path;

use crate::error::{ReadError, Result};

/// Lane and tile numbers recovered from a position file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneTile {
    pub lane: i32,
    pub tile: i32,
}

const SUFFIXES: [&str; 3] = ["_pos.txt", ".locs", ".clocs"];
const COMPRESSION_SUFFIXES: [&str; 2] = [".gz", ".bz2"];

/// Parses `s_<lane>_<tile>` out of a position file path
///
/// # Errors
///
/// Fails with [`ReadError::MalformedFilename`] when the file name does not
/// match the convention.
pub fn parse_position_filename<P: AsRef<Path>>(path: P) -> Result<LaneTile> {
    let name = path
        .as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| malformed(path.as_ref()))?;

    let mut stem = name;
    for suffix in COMPRESSION_SUFFIXES {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            stem = stripped;
            break;
        }
    }

    let mut body = None;
    for suffix in SUFFIXES {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            body = Some(stripped);
            break;
        }
    }
    let body = body.ok_or_else(|| malformed(path.as_ref()))?;

    let rest = body
        .strip_prefix("s_")
        .ok_or_else(|| malformed(path.as_ref()))?;
    let (lane_str, tile_str) = rest
        .split_once('_')
        .ok_or_else(|| malformed(path.as_ref()))?;
    let lane = lane_str
        .parse::<i32>()
        .map_err(|_| malformed(path.as_ref()))?;
    let tile = tile_str
        .parse::<i32>()
        .map_err(|_| malformed(path.as_ref()))?;

    Ok(LaneTile { lane, tile })
}

fn malformed(path: &Path) -> crate::Error {
    ReadError::MalformedFilename(path.to_string_lossy().to_string()).into()
}
