//! Tokenized text units.
//!
//! A [`TokenizedUnit`] is the immutable anchor that spans are addressed
//! against: the raw text of a sentence (or other text body), its ordered
//! tokens, the byte offset of each token's first character, and any number
//! of per-token attribute sequences aligned with the tokens
//! (lemmas, part-of-speech tags, dependency arcs, ...).
//!
//! Tokenization and linguistic analysis happen upstream; this module only
//! holds their results and answers coordinate queries over them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{SpanError, SpanResult};

/// Reserved attribute name resolving to the raw token sequence.
///
/// Projecting a span through this name reads the unit's original text
/// (preserving inter-token whitespace), never a re-join of tokens.
pub const WORDS: &str = "words";
/// Well-known attribute name for lemmas.
pub const LEMMAS: &str = "lemmas";
/// Well-known attribute name for part-of-speech tags.
pub const POS_TAGS: &str = "poses";
/// Well-known attribute name for dependency-parent token indices.
pub const DEP_PARENTS: &str = "dep_parents";
/// Well-known attribute name for dependency labels.
pub const DEP_LABELS: &str = "dep_labels";

/// An aligned per-token attribute sequence.
///
/// Linguistic attributes are either string-valued (lemmas, tags, labels)
/// or token-index-valued (dependency parents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValues {
    Text(Vec<String>),
    Indices(Vec<usize>),
}

impl AttrValues {
    pub fn len(&self) -> usize {
        match self {
            AttrValues::Text(values) => values.len(),
            AttrValues::Indices(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the inclusive token range `[start, end]` of this sequence.
    ///
    /// Callers guarantee `start <= end < len`; span projection always does.
    pub(crate) fn slice(&self, start: usize, end: usize) -> AttrSlice<'_> {
        match self {
            AttrValues::Text(values) => AttrSlice::Text(&values[start..=end]),
            AttrValues::Indices(values) => AttrSlice::Indices(&values[start..=end]),
        }
    }
}

/// A borrowed view over a contiguous run of one attribute's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrSlice<'a> {
    Text(&'a [String]),
    Indices(&'a [usize]),
}

impl<'a> AttrSlice<'a> {
    pub fn len(&self) -> usize {
        match self {
            AttrSlice::Text(values) => values.len(),
            AttrSlice::Indices(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the values joined with `sep`.
    pub fn join(&self, sep: &str) -> String {
        match self {
            AttrSlice::Text(values) => values.join(sep),
            AttrSlice::Indices(values) => values
                .iter()
                .map(|index| index.to_string())
                .collect::<Vec<_>>()
                .join(sep),
        }
    }
}

/// A text body with precomputed token boundaries and aligned attributes.
///
/// Immutable after construction. Many spans may share one unit (via `Arc`)
/// across threads without synchronization, since nothing here mutates.
///
/// Offsets are byte indices into `text` (UTF-8), one per token, strictly
/// increasing: `char_offsets[i]` is where `tokens[i]` begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedUnit {
    text: String,
    tokens: Vec<String>,
    char_offsets: Vec<usize>,
    attributes: HashMap<String, AttrValues>,
}

impl TokenizedUnit {
    /// Create a unit from raw text, its tokens, and per-token start offsets.
    ///
    /// Fails with [`SpanError::InvalidUnit`] when the sequences are
    /// misaligned, the offsets are not strictly increasing, or an offset
    /// points past the text.
    pub fn new(
        text: impl Into<String>,
        tokens: Vec<String>,
        char_offsets: Vec<usize>,
    ) -> SpanResult<Self> {
        let text = text.into();
        if tokens.is_empty() {
            return Err(SpanError::InvalidUnit {
                reason: "unit has no tokens".to_string(),
            });
        }
        if tokens.len() != char_offsets.len() {
            return Err(SpanError::InvalidUnit {
                reason: format!(
                    "{} tokens but {} char offsets",
                    tokens.len(),
                    char_offsets.len()
                ),
            });
        }
        for pair in char_offsets.windows(2) {
            if pair[1] <= pair[0] {
                return Err(SpanError::InvalidUnit {
                    reason: format!(
                        "char offsets not strictly increasing ({} then {})",
                        pair[0], pair[1]
                    ),
                });
            }
        }
        if let Some(&last) = char_offsets.last() {
            if last >= text.len() {
                return Err(SpanError::InvalidUnit {
                    reason: format!(
                        "char offset {} outside text of length {}",
                        last,
                        text.len()
                    ),
                });
            }
        }
        Ok(Self {
            text,
            tokens,
            char_offsets,
            attributes: HashMap::new(),
        })
    }

    /// Attach an aligned attribute sequence, consuming and returning the unit.
    ///
    /// The sequence must have one value per token, and the reserved
    /// [`WORDS`] name cannot be shadowed.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        values: AttrValues,
    ) -> SpanResult<Self> {
        let name = name.into();
        if name == WORDS {
            return Err(SpanError::InvalidUnit {
                reason: format!("attribute name '{}' is reserved", WORDS),
            });
        }
        if values.len() != self.tokens.len() {
            return Err(SpanError::InvalidUnit {
                reason: format!(
                    "attribute '{}' has {} values for {} tokens",
                    name,
                    values.len(),
                    self.tokens.len()
                ),
            });
        }
        self.attributes.insert(name, values);
        Ok(self)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn char_offsets(&self) -> &[usize] {
        &self.char_offsets
    }

    /// Number of tokens in the unit.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Look up an attached attribute sequence by name.
    ///
    /// The reserved [`WORDS`] name is not stored here; it resolves through
    /// [`TokenizedUnit::attribute_slice`].
    pub fn attribute(&self, name: &str) -> Option<&AttrValues> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        name == WORDS || self.attributes.contains_key(name)
    }

    /// Names of the attached attribute sequences (excluding [`WORDS`]).
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Map a character index to the index of the token that owns it.
    ///
    /// The owning token is the one with the largest start offset that is
    /// `<= ci` (a floor lookup over the strictly increasing offsets). A
    /// character at or past the last token's offset belongs to the last
    /// token. A character before the first token's offset has no owner and
    /// is reported as [`SpanError::NoOwningToken`].
    pub fn char_to_word_index(&self, ci: usize) -> SpanResult<usize> {
        let first_offset = self.char_offsets[0];
        if ci < first_offset {
            return Err(SpanError::NoOwningToken {
                char_index: ci,
                first_offset,
            });
        }
        // partition_point counts offsets <= ci; the floor is one before it.
        Ok(self.char_offsets.partition_point(|&offset| offset <= ci) - 1)
    }

    /// Map a token index to the character offset of the token's first char.
    pub fn word_to_char_index(&self, wi: usize) -> SpanResult<usize> {
        self.char_offsets
            .get(wi)
            .copied()
            .ok_or(SpanError::IndexOutOfRange {
                index: wi,
                len: self.char_offsets.len(),
            })
    }

    /// Borrow the values of attribute `name` over the inclusive token range
    /// `[start_word, end_word]`.
    ///
    /// The reserved [`WORDS`] name resolves against the token sequence
    /// itself; anything else must have been attached via
    /// [`TokenizedUnit::with_attribute`]. A reversed or out-of-bounds token
    /// range fails with [`SpanError::IndexOutOfRange`].
    pub fn attribute_slice(
        &self,
        name: &str,
        start_word: usize,
        end_word: usize,
    ) -> SpanResult<AttrSlice<'_>> {
        let len = self.tokens.len();
        if end_word >= len || start_word > end_word {
            return Err(SpanError::IndexOutOfRange {
                index: end_word,
                len,
            });
        }
        if name == WORDS {
            return Ok(AttrSlice::Text(&self.tokens[start_word..=end_word]));
        }
        self.attributes
            .get(name)
            .map(|values| values.slice(start_word, end_word))
            .ok_or_else(|| SpanError::UnknownAttribute(name.to_string()))
    }
}
