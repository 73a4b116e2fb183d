//! Illumina per-cluster file readers
//!
//! Each sequencing tile produces a family of small binary files describing
//! its clusters: base calls (`bcl`), pass-filter flags (`filter`), physical
//! coordinates (`locs`, `clocs`, `pos.txt`), and run-level statistics
//! (`TileMetricsOut.bin`). All of them share a fixed-header-plus-records
//! layout, read here through the memory-mapped [`iter::BinaryFileIterator`].
//!
//! Readers validate everything they can at construction: magic constants,
//! versions, and declared counts against the physical file size. Record
//! access is a pull API, `has_next`/`next`, where `next` past the end is an
//! error rather than an `Option`.

pub mod bcl;
pub mod clocs;
pub mod filename;
pub mod filter;
pub mod iter;
pub mod locs;
pub mod pos;
pub mod tile_metrics;

pub use bcl::{decode_basecall, BclData, BclReader};
pub use clocs::ClocsReader;
pub use filename::{parse_position_filename, LaneTile};
pub use filter::FilterReader;
pub use iter::{BinaryFileIterator, Element};
pub use locs::LocsReader;
pub use pos::PosReader;
pub use tile_metrics::{TileMetricsReader, TileMetricsRecord};

/// One cluster position on a tile, in tile image coordinates
///
/// Lane and tile are carried along from the file name so position streams
/// from many tiles can be merged without losing provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRecord {
    pub x: f32,
    pub y: f32,
    pub lane: i32,
    pub tile: i32,
}
