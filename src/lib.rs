//! # flowcell
//!
//! Readers for Illumina per-cluster binary files and builders for feature
//! file indices, sharing one strict little-endian decoding layer.
//!
//! ## Cluster files
//!
//! Every tile of a sequencing run writes a family of small binary files:
//! base calls ([`cluster::BclReader`]), pass-filter flags
//! ([`cluster::FilterReader`]), cluster coordinates ([`cluster::LocsReader`],
//! [`cluster::ClocsReader`], [`cluster::PosReader`]), and run statistics
//! ([`cluster::TileMetricsReader`]). All validate their headers and declared
//! counts aggressively at construction and expose a `has_next`/`next` pull
//! API.
//!
//! ```no_run
//! use flowcell::cluster::BclReader;
//!
//! # fn main() -> flowcell::Result<()> {
//! let mut reader = BclReader::new("s_1_1101.bcl")?;
//! while reader.has_next() {
//!     let call = reader.next()?;
//!     println!("{}{}", call.base as char, call.quality);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature indices
//!
//! Index builders take one sorted pass over `(chromosome, start, end,
//! file_offset)` tuples and produce a serializable [`index::Index`] that
//! answers region queries with byte ranges:
//!
//! ```
//! use flowcell::index::{IndexBalanceApproach, DynamicIndexCreator};
//!
//! # fn main() -> flowcell::Result<()> {
//! let mut creator = DynamicIndexCreator::new("features.bed", IndexBalanceApproach::ForSeekTime);
//! creator.add_feature("chr1", 100, 150, 0)?;
//! creator.add_feature("chr1", 200, 210, 50)?;
//! let index = creator.finalize(120)?;
//! let blocks = index.get_blocks("chr1", 120, 140)?;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod codec;
pub mod error;
pub mod index;

pub use codec::{LittleEndianReader, LittleEndianWriter};
pub use error::{Error, HeaderError, IndexError, ReadError, Result};
