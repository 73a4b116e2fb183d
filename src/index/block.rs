//! Byte-range blocks
//!
//! A block maps a slice of genomic coordinate space to the byte range of the
//! feature file holding its records. Blocks are immutable once an index is
//! built; only builders adjust sizes while accumulating.

/// A contiguous byte range within an indexed feature file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    start_position: u64,
    size: u64,
}

impl Block {
    #[must_use]
    pub fn new(start_position: u64, size: u64) -> Self {
        Self {
            start_position,
            size,
        }
    }

    /// First byte of the range
    #[must_use]
    pub fn start_position(&self) -> u64 {
        self.start_position
    }

    /// Length of the range in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// One past the last byte of the range
    #[must_use]
    pub fn end_position(&self) -> u64 {
        self.start_position + self.size
    }

    /// Moves the end of the range, keeping the start fixed
    ///
    /// Builder-time only: blocks get their true ends once the offset of the
    /// following block (or the end of file) is known.
    pub fn set_end_position(&mut self, end_position: u64) {
        self.size = end_position - self.start_position;
    }
}
