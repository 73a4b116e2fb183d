//! Memory-mapped binary record iteration
//!
//! Illumina per-cluster files share one physical shape: a small fixed-size
//! header followed by a run of fixed-stride little-endian records. This module
//! provides [`BinaryFileIterator`], a generic pull iterator over that shape.
//!
//! On construction the file is memory-mapped read-only, the first
//! `header_size` bytes are copied into an owned buffer retrievable via
//! [`BinaryFileIterator::header_bytes`], and the stream is positioned at the
//! first record. The element count arithmetic
//! (`elements_in_file`/`extra_bytes`) lets format readers validate file
//! completeness before decoding a single record.

use std::fs::File;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;

use crate::error::{HeaderError, ReadError, Result};

/// A fixed-size element decodable from a little-endian byte stride
///
/// Implementations read exactly [`Element::SIZE`] bytes and reinterpret them;
/// no sign promotion or byte swapping beyond little-endian decoding happens
/// here.
pub trait Element: Sized {
    /// The stride of one element in bytes
    const SIZE: usize;

    /// Decodes one element from a buffer of exactly [`Element::SIZE`] bytes
    fn decode(buf: &[u8]) -> Self;
}

impl Element for u8 {
    const SIZE: usize = 1;

    fn decode(buf: &[u8]) -> Self {
        buf[0]
    }
}

impl Element for i32 {
    const SIZE: usize = 4;

    fn decode(buf: &[u8]) -> Self {
        LittleEndian::read_i32(buf)
    }
}

impl Element for f32 {
    const SIZE: usize = 4;

    fn decode(buf: &[u8]) -> Self {
        LittleEndian::read_f32(buf)
    }
}

/// A pull iterator over the fixed-stride records of a memory-mapped file
///
/// The iterator owns its file mapping exclusively for its lifetime; dropping
/// it releases the mapping. `next_element` follows the standard pull
/// discipline: it fails with [`ReadError::Exhausted`] once the underlying
/// bytes run out.
#[derive(Debug)]
pub struct BinaryFileIterator<E: Element> {
    mmap: Mmap,
    path: PathBuf,
    header: Vec<u8>,
    pos: usize,
    _element: PhantomData<E>,
}

impl<E: Element> BinaryFileIterator<E> {
    /// Maps `path` and captures the first `header_size` bytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be opened or is not a regular file
    /// * The file is shorter than `header_size`
    pub fn new<P: AsRef<Path>>(header_size: usize, path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(ReadError::IncompatibleFile.into());
        }
        if (header_size as u64) > metadata.len() {
            return Err(HeaderError::HeaderPastEndOfFile(header_size, metadata.len()).into());
        }

        // Safety: the file is open and won't be modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        let header = mmap[..header_size].to_vec();

        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
            header,
            pos: header_size,
            _element: PhantomData,
        })
    }

    /// The bytes found in the first `header_size` bytes of the file
    #[must_use]
    pub fn header_bytes(&self) -> &[u8] {
        &self.header
    }

    /// The stride of one element in bytes
    #[must_use]
    pub fn element_size(&self) -> usize {
        E::SIZE
    }

    /// The number of whole elements the file body can hold
    #[must_use]
    pub fn elements_in_file(&self) -> u64 {
        ((self.mmap.len() - self.header.len()) / E::SIZE) as u64
    }

    /// Bytes left over after the header and all whole elements
    #[must_use]
    pub fn extra_bytes(&self) -> u64 {
        self.mmap.len() as u64 - self.header.len() as u64 - self.elements_in_file() * E::SIZE as u64
    }

    /// The path the iterator was constructed from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes remaining past the current read position
    #[must_use]
    pub fn remaining_bytes(&self) -> u64 {
        (self.mmap.len() - self.pos) as u64
    }

    /// Asserts the file is exactly `header + expected * element_size` bytes
    ///
    /// Fails if the element count differs from `expected` OR if any trailing
    /// bytes exist — no slack is permitted in either direction.
    pub fn assert_total_elements_equal(&self, expected: u64) -> Result<()> {
        if self.elements_in_file() != expected {
            return Err(ReadError::ElementCountMismatch {
                expected,
                found: self.elements_in_file(),
            }
            .into());
        }
        if self.extra_bytes() != 0 {
            return Err(ReadError::TrailingBytes {
                expected: self.header.len() as u64 + expected * E::SIZE as u64,
                found: self.mmap.len() as u64,
            }
            .into());
        }
        Ok(())
    }

    /// Whether at least one whole element remains
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.mmap.len() - self.pos >= E::SIZE
    }

    /// Decodes the next element
    ///
    /// # Errors
    ///
    /// Fails with [`ReadError::Exhausted`] if no whole element remains.
    pub fn next_element(&mut self) -> Result<E> {
        if !self.has_next() {
            return Err(ReadError::Exhausted.into());
        }
        let element = E::decode(&self.mmap[self.pos..self.pos + E::SIZE]);
        self.pos += E::SIZE;
        Ok(element)
    }
}
