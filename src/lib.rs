//! Character-span data model for information-extraction pipelines.
//!
//! Documents decompose into sentences, sentences into tokens, and arbitrary
//! character ranges over a sentence ("spans") are what candidate-extraction
//! logic actually consumes. This crate provides the span/offset core:
//! character/token coordinate mapping, attribute projection, containment,
//! slicing, and the transient-to-persisted promotion boundary.
//!
//! ## Core Types
//!
//! - [`TokenizedUnit`] - Immutable tokenized text with aligned attributes
//! - [`Span`] - Inclusive character range anchored to a unit
//! - [`SpanStore`] - In-memory registry with identity-per-triple promotion
//! - [`Document`] / [`Sentence`] / [`Corpus`] - The surrounding hierarchy
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use charspan::{Span, TokenizedUnit};
//!
//! let unit = Arc::new(TokenizedUnit::new(
//!     "The cat sat.",
//!     vec!["The".into(), "cat".into(), "sat".into(), ".".into()],
//!     vec![0, 4, 8, 11],
//! ).unwrap());
//!
//! let span = Span::new(Arc::clone(&unit), 4, 10).unwrap();
//! assert_eq!(span.span_text(), "cat sat");
//! assert_eq!(span.word_start().unwrap(), 1);
//! assert_eq!(span.word_end().unwrap(), 2);
//!
//! let cat = span.slice(None, Some(-4)).unwrap();
//! assert_eq!(cat.span_text(), "cat");
//! assert!(span.contains(&cat));
//! ```

mod context;
mod errors;
mod span;
mod store;
mod unit;

// Tokenized units and attributes
pub use unit::{
    AttrSlice,
    AttrValues,
    TokenizedUnit,
    DEP_LABELS,
    DEP_PARENTS,
    LEMMAS,
    POS_TAGS,
    WORDS,
};

// The span core
pub use span::{
    Identity,
    SliceRequest,
    Span,
};

// Context hierarchy
pub use context::{
    ContextId,
    ContextKind,
    ContextRef,
    Corpus,
    Document,
    Sentence,
};

// Store boundary
pub use store::{
    IdentityAllocator,
    SequentialIds,
    SpanStore,
};

// Errors
pub use errors::{
    SpanError,
    SpanResult,
};

#[cfg(test)]
mod tests {
    mod integration;
}
