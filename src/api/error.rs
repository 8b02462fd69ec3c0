//! Error types returned by the public [`crate::api::store::Store`] API.
//!
//! Mirrors the shape of the teacher's per-concern error enums (e.g.
//! `api::traits::filedata::errors::FileProviderError`): one
//! [`thiserror::Error`]-derived enum per failure domain, third-party errors
//! wrapped with `#[from]` rather than stringified.

use std::str::Utf8Error;
use thiserror::Error;

/// Errors that can occur decoding a block of stored bytes back to characters.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes read for a block were not valid UTF-8. Should be unreachable
    /// in normal operation since block boundaries are always chosen on
    /// character boundaries by the ingestion engine (spec-level invariant);
    /// surfaced as a typed error rather than a panic so a corrupted data file
    /// fails loudly instead of silently.
    #[error("block bytes were not valid UTF-8 at a character boundary")]
    InvalidUtf8(#[from] Utf8Error),
}

/// Errors returned by [`crate::api::store::Store`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// `starts` and `ends` passed to `retrieve_parts` differ in length.
    #[error("starts and ends must have the same length (got {starts} and {ends})")]
    ShapeMismatch { starts: usize, ends: usize },

    /// A `(start, end)` pair had a negative value other than the `(-1, -1)`
    /// sentinel for "whole entry".
    #[error("illegal range ({start}, {end}): negative values are only valid as the (-1, -1) sentinel")]
    IllegalValues { start: i64, end: i64 },

    /// A `(start, end)` pair referenced a character offset beyond the
    /// entry's length.
    #[error("range ({start}, {end}) is out of range for an entry of length {len} characters")]
    OutOfRange { start: i64, end: i64, len: u32 },

    /// A `(start, end)` pair had `end <= start`.
    #[error("empty or negative snippet: start {start} >= end {end}")]
    EmptySnippet { start: i64, end: i64 },

    /// The data file yielded fewer bytes than the TOC entry prescribed for a
    /// block; indicates the data file is missing bytes a live TOC entry
    /// claims exist.
    #[error("short block: expected {expected} bytes at offset {offset} in data file {file_id}, got {actual}")]
    ShortBlock {
        file_id: u32,
        offset: u32,
        expected: usize,
        actual: usize,
    },

    /// Attempted to encode and append an empty block. The ingestion state
    /// machine guarantees a boundary is only crossed once characters have
    /// been appended to `current_block_chars`; reaching this means that
    /// invariant broke.
    #[error("internal invariant violation: attempted to encode an empty block")]
    InternalInvariant,

    /// `open(dir, create = false)` was called on a directory missing the
    /// store's type marker file.
    #[error("{0:?} does not contain a content-store (missing type marker file)")]
    NotAStore(std::path::PathBuf),

    /// The TOC file declares a format the store doesn't understand.
    #[error("unsupported store format marker: {0:?}")]
    UnsupportedStoreVersion(String),
}
