use std::io;

/// A specialized `Result` type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reading or writing an archive.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The byte stream is not a well-formed archive: bad global header, bad
    /// per-entry end magic, a blank size field, or an unresolvable long-name
    /// reference.
    #[error("corrupted archive data: {0}")]
    Format(String),

    /// The stream ended before a fixed-width field or a payload was complete.
    #[error("unexpected end of stream: expected {expected} bytes, read {actual}")]
    Truncated {
        /// Number of bytes the field or payload required.
        expected: u64,
        /// Number of bytes actually available.
        actual: u64,
    },

    /// A field's textual rendering does not fit its fixed byte width, or is
    /// not ASCII.
    #[error("cannot encode field: {0}")]
    Encoding(String),

    /// An entry failed validation before any bytes were written.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// An operation was attempted on a closed reader, or entries were
    /// supplied twice to a single-use writer.
    #[error("{0}")]
    State(&'static str),

    /// An I/O failure in the underlying stream or sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}
