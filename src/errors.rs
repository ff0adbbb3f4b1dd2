//! Error types for the span data model.
//!
//! Every failure here is a local, synchronous contract violation or
//! data-quality issue reported to the immediate caller. The core never
//! retries, recovers, or logs on its own.

use thiserror::Error;

/// Errors that can occur while constructing or querying spans.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    /// A tokenized unit's construction invariants are broken
    /// (misaligned sequences, non-increasing offsets, offsets past the text).
    #[error("invalid tokenized unit: {reason}")]
    InvalidUnit { reason: String },

    /// A span's character range is empty, reversed, or outside its unit's text.
    #[error("invalid char range [{start}, {end}] for text of length {len}")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// The requested attribute name is absent from the unit's attribute map.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A token index is outside the unit's token sequence.
    #[error("token index {index} out of range for {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },

    /// Stepped (non-contiguous) slicing was requested.
    #[error("stepped slicing is not supported")]
    UnsupportedSlice,

    /// A character index precedes the first token's offset, so no token owns it.
    #[error("char index {char_index} precedes first token offset {first_offset}")]
    NoOwningToken {
        char_index: usize,
        first_offset: usize,
    },

    /// A document or corpus name is already registered in the store.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A sentence position is already taken within its document.
    #[error("duplicate sentence position {position} in document '{document}'")]
    DuplicatePosition { document: String, position: usize },

    /// A document name is not registered in the store.
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    /// A corpus name is not registered in the store.
    #[error("unknown corpus: {0}")]
    UnknownCorpus(String),
}

/// Result type for span operations.
pub type SpanResult<T> = Result<T, SpanError>;
