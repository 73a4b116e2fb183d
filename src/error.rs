/// Custom Result type for flowcell operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the flowcell library, encompassing all possible error
/// cases that can occur while decoding cluster files or building and querying
/// feature indices.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors raised while validating file headers and fixed format constants
    HeaderError(#[from] HeaderError),
    /// Errors that occur while reading record bodies
    ReadError(#[from] ReadError),
    /// Errors raised while building or querying feature indices
    IndexError(#[from] IndexError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// UTF-8 encoding/decoding errors
    Utf8Error(#[from] std::str::Utf8Error),
    /// Generic errors that can occur in any part of the system
    AnyhowError(#[from] anyhow::Error),
}

/// Errors specific to processing and validating binary file headers
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// The magic number in the header does not match the expected value
    #[error("Invalid magic number: {0:#010x}")]
    InvalidMagicNumber(u32),

    /// The format version field does not match the single supported value
    #[error("Unsupported format version: {found}. Expected: {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// A fixed header constant holds an unexpected value
    #[error("Invalid value for header field {field}: {found}")]
    InvalidHeaderField { field: &'static str, found: String },

    /// The index type identifier is not one of the known index variants
    #[error("Unknown index type identifier: {0}")]
    InvalidIndexType(u32),

    /// The declared header is larger than the file that should contain it
    ///
    /// First field is the header size, second is the file size.
    #[error("Header size ({0}) exceeds file size ({1})")]
    HeaderPastEndOfFile(usize, u64),
}

/// Errors that can occur while reading binary record bodies
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file being read is not a regular file (e.g., it might be a directory)
    #[error("File is not regular")]
    IncompatibleFile,

    /// Fewer bytes were available than a primitive read requires
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,

    /// `next` was called on an exhausted iterator
    #[error("Iterator is exhausted, no elements remain")]
    Exhausted,

    /// The number of elements in the file does not match the declared count
    #[error("Expected {expected} elements in file but found {found}")]
    ElementCountMismatch { expected: u64, found: u64 },

    /// The file length is not exactly `header + elements * element_size` bytes
    #[error("Malformed file, expected {expected} bytes in file, found {found}")]
    TrailingBytes { expected: u64, found: u64 },

    /// The declared record/bin count is exhausted but the stream has more bytes
    ///
    /// This signals truncation or corruption elsewhere, not benign padding.
    #[error("All {0} declared bins consumed but unread bytes remain in stream")]
    TrailingData(u32),

    /// A called base carries a quality below the format minimum of 2
    #[error("Invalid quality {quality} decoded from BCL byte {byte:#04x}: called bases require quality >= 2")]
    InvalidQuality { byte: u8, quality: u8 },

    /// A filter byte outside the legal domain of 0x00/0x01
    #[error("Invalid filter byte: {0:#04x}. Expected 0x00 or 0x01")]
    InvalidFilterByte(u8),

    /// A position file name does not follow the `s_<lane>_<tile>` convention
    #[error("Malformed position file name: {0}")]
    MalformedFilename(String),

    /// A text position line that is not two whitespace-separated numbers
    #[error("Malformed position line: {0:?}")]
    MalformedPositionLine(String),
}

/// Errors raised while building or querying feature indices
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// A feature started before its predecessor on the same chromosome
    #[error("Unsorted input: saw {chrom}:{start} after {chrom}:{last_start}")]
    UnsortedInput {
        chrom: String,
        start: i32,
        last_start: i32,
    },

    /// A chromosome reappeared after features from another chromosome
    #[error("Discontinuous contig: {0} reappeared after being left")]
    DiscontinuousContig(String),

    /// A query named a chromosome absent from the index
    #[error("Query against unknown contig: {0}")]
    UnknownContig(String),

    /// Block merging failed to converge
    #[error("Too many merge passes optimizing contig {0}")]
    TooManyMergePasses(String),

    /// Candidate selection ran with no candidate creators
    #[error("No candidate index creators to select from")]
    NoCandidates,
}
