//! Character spans over tokenized units.
//!
//! A [`Span`] is an inclusive character range `[char_start, char_end]`
//! anchored to a shared [`TokenizedUnit`]. Candidate-extraction logic
//! constructs many transient spans over one unit, queries them (word range,
//! attribute projection, containment), derives new spans by slicing, and
//! promotes the keepers into persisted, identity-bearing spans.
//!
//! Spans are fixed at construction. All operations are pure reads over the
//! immutable unit, so any number of spans can share a unit across threads.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::context::ContextId;
use crate::errors::{SpanError, SpanResult};
use crate::store::IdentityAllocator;
use crate::unit::{AttrSlice, TokenizedUnit, WORDS};

/// Identity state of a span.
///
/// Transient spans are freely constructed working values with no durable
/// identity. Promotion produces a `Persisted` span whose identity came from
/// an [`IdentityAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Transient,
    Persisted(ContextId),
}

/// A contiguous slice request relative to a span's own range.
///
/// Follows Python slice conventions expressed in character offsets from the
/// span's start: `stop` is exclusive when non-negative, and negative `stop`
/// counts back from the span's end. A `step` is never honored; requesting
/// one fails with [`SpanError::UnsupportedSlice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceRequest {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

/// An inclusive character range within one [`TokenizedUnit`].
#[derive(Clone)]
pub struct Span {
    unit: Arc<TokenizedUnit>,
    char_start: usize,
    char_end: usize,
    metadata: Option<serde_json::Value>,
    identity: Identity,
}

impl Span {
    /// Create a transient span over `[char_start, char_end]` (inclusive).
    ///
    /// Fails with [`SpanError::InvalidRange`] when the range is reversed,
    /// reaches past the unit's text, or cuts a UTF-8 character in half.
    pub fn new(unit: Arc<TokenizedUnit>, char_start: usize, char_end: usize) -> SpanResult<Self> {
        let text = unit.text();
        let valid = char_start <= char_end
            && char_end < text.len()
            && text.is_char_boundary(char_start)
            && text.is_char_boundary(char_end + 1);
        if !valid {
            return Err(SpanError::InvalidRange {
                start: char_start,
                end: char_end,
                len: text.len(),
            });
        }
        Ok(Self {
            unit,
            char_start,
            char_end,
            metadata: None,
            identity: Identity::Transient,
        })
    }

    /// Attach an opaque metadata payload. The core never interprets it.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn unit(&self) -> &Arc<TokenizedUnit> {
        &self.unit
    }

    pub fn char_start(&self) -> usize {
        self.char_start
    }

    pub fn char_end(&self) -> usize {
        self.char_end
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.identity, Identity::Persisted(_))
    }

    /// Number of characters covered (the range is inclusive, so at least 1).
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start + 1
    }

    /// True when both spans anchor to the same unit instance.
    pub fn same_unit(&self, other: &Span) -> bool {
        Arc::ptr_eq(&self.unit, &other.unit)
    }

    /// Index of the token owning the span's first character.
    pub fn word_start(&self) -> SpanResult<usize> {
        self.unit.char_to_word_index(self.char_start)
    }

    /// Index of the token owning the span's last character.
    pub fn word_end(&self) -> SpanResult<usize> {
        self.unit.char_to_word_index(self.char_end)
    }

    /// Number of tokens the span touches.
    pub fn token_count(&self) -> SpanResult<usize> {
        Ok(self.word_end()? - self.word_start()? + 1)
    }

    /// Values of attribute `name` over the tokens this span covers.
    pub fn attrib_tokens(&self, name: &str) -> SpanResult<AttrSlice<'_>> {
        let start_word = self.word_start()?;
        let end_word = self.word_end()?;
        self.unit.attribute_slice(name, start_word, end_word)
    }

    /// Project attribute `name` over the span as a single string.
    ///
    /// The reserved [`WORDS`] name returns the exact substring of the
    /// unit's raw text, inter-token whitespace and all. Derived attributes
    /// have no original formatting to preserve, so their values are joined
    /// with `sep`.
    pub fn attrib_span(&self, name: &str, sep: &str) -> SpanResult<String> {
        if name == WORDS {
            return Ok(self.span_text().to_string());
        }
        Ok(self.attrib_tokens(name)?.join(sep))
    }

    /// The raw text the span covers, exactly as it appears in the unit.
    pub fn span_text(&self) -> &str {
        &self.unit.text()[self.char_start..=self.char_end]
    }

    /// Pure numeric range containment: `other`'s range lies within this
    /// span's range.
    ///
    /// Unit agreement is the caller's obligation; compose with
    /// [`Span::same_unit`] when comparing spans that may come from
    /// different units.
    pub fn contains(&self, other: &Span) -> bool {
        other.char_start >= self.char_start && other.char_end <= self.char_end
    }

    /// Derive a sub-span by character offsets relative to this span's range.
    ///
    /// Shorthand for [`Span::slice_with`] without a step. `None` bounds keep
    /// the corresponding end of the current range.
    pub fn slice(&self, start: Option<isize>, stop: Option<isize>) -> SpanResult<Span> {
        self.slice_with(SliceRequest {
            start,
            stop,
            step: None,
        })
    }

    /// Derive a sub-span from a [`SliceRequest`].
    ///
    /// The result always references the same unit and is always transient
    /// with no metadata, even when `self` is persisted; promotion is a
    /// separate explicit step. A request whose resolved range violates the
    /// span invariant fails with [`SpanError::InvalidRange`].
    pub fn slice_with(&self, request: SliceRequest) -> SpanResult<Span> {
        if request.step.is_some() {
            return Err(SpanError::UnsupportedSlice);
        }
        let start = match request.start {
            None => self.char_start as isize,
            Some(offset) => self.char_start as isize + offset,
        };
        let end = match request.stop {
            None => self.char_end as isize,
            Some(stop) if stop >= 0 => self.char_start as isize + stop - 1,
            Some(stop) => self.char_end as isize + stop,
        };
        if start < 0 || end < start {
            return Err(SpanError::InvalidRange {
                start: start.max(0) as usize,
                end: end.max(0) as usize,
                len: self.unit.text().len(),
            });
        }
        Span::new(Arc::clone(&self.unit), start as usize, end as usize)
    }

    /// Promote this span into persisted form with a freshly allocated
    /// identity.
    ///
    /// Unit, range, and metadata are copied exactly. Each call allocates;
    /// deduplication on the `(unit, char_start, char_end)` triple is the
    /// store's concern, not the allocator's.
    pub fn promote<A: IdentityAllocator>(&self, ids: &mut A) -> Span {
        Span {
            unit: Arc::clone(&self.unit),
            char_start: self.char_start,
            char_end: self.char_end,
            metadata: self.metadata.clone(),
            identity: Identity::Persisted(ids.allocate()),
        }
    }
}

/// Dual equality: persisted spans compare by identity, every other pairing
/// falls back to structural comparison on the `(unit, char_start, char_end)`
/// triple.
impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        match (self.identity, other.identity) {
            (Identity::Persisted(a), Identity::Persisted(b)) => a == b,
            _ => {
                self.same_unit(other)
                    && self.char_start == other.char_start
                    && self.char_end == other.char_end
            }
        }
    }
}

impl Eq for Span {}

/// Hashes the content triple. Consistent with equality as long as the store
/// upholds at-most-one identity per triple.
impl Hash for Span {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.unit) as usize).hash(state);
        self.char_start.hash(state);
        self.char_end.hash(state);
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Span({:?}, chars=[{},{}]",
            self.span_text(),
            self.char_start,
            self.char_end
        )?;
        if let (Ok(ws), Ok(we)) = (self.word_start(), self.word_end()) {
            write!(f, ", words=[{},{}]", ws, we)?;
        }
        if let Identity::Persisted(id) = self.identity {
            write!(f, ", id={}", id)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SequentialIds;
    use crate::unit::{AttrValues, LEMMAS, POS_TAGS};

    fn cat_unit() -> Arc<TokenizedUnit> {
        Arc::new(
            TokenizedUnit::new(
                "The cat sat.",
                vec!["The".into(), "cat".into(), "sat".into(), ".".into()],
                vec![0, 4, 8, 11],
            )
            .unwrap()
            .with_attribute(
                LEMMAS,
                AttrValues::Text(vec![
                    "the".into(),
                    "cat".into(),
                    "sit".into(),
                    ".".into(),
                ]),
            )
            .unwrap()
            .with_attribute(
                POS_TAGS,
                AttrValues::Text(vec![
                    "DT".into(),
                    "NN".into(),
                    "VBD".into(),
                    ".".into(),
                ]),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_rejects_reversed_or_overlong_range() {
        let unit = cat_unit();
        assert!(matches!(
            Span::new(Arc::clone(&unit), 5, 4),
            Err(SpanError::InvalidRange { .. })
        ));
        assert!(matches!(
            Span::new(Arc::clone(&unit), 0, 12),
            Err(SpanError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_rejects_split_utf8_char() {
        let unit = Arc::new(
            TokenizedUnit::new("héllo there", vec!["héllo".into(), "there".into()], vec![0, 6])
                .unwrap(),
        );
        // "é" occupies bytes 1..3; ending at byte 1 splits it
        assert!(matches!(
            Span::new(unit, 0, 1),
            Err(SpanError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_word_range_and_span_text() {
        // The worked example: chars [4, 10] covers "cat sat"
        let span = Span::new(cat_unit(), 4, 10).unwrap();
        assert_eq!(span.word_start().unwrap(), 1);
        assert_eq!(span.word_end().unwrap(), 2);
        assert_eq!(span.token_count().unwrap(), 2);
        assert_eq!(span.span_text(), "cat sat");
        assert_eq!(span.char_len(), 7);
    }

    #[test]
    fn test_full_span_preserves_raw_text() {
        let unit = cat_unit();
        let text_len = unit.text().len();
        let span = Span::new(Arc::clone(&unit), 0, text_len - 1).unwrap();
        assert_eq!(span.attrib_span(WORDS, "|").unwrap(), "The cat sat.");
    }

    #[test]
    fn test_attrib_projection() {
        let span = Span::new(cat_unit(), 4, 10).unwrap();
        assert_eq!(span.attrib_span(LEMMAS, " ").unwrap(), "cat sit");
        assert_eq!(span.attrib_span(POS_TAGS, "+").unwrap(), "NN+VBD");
        assert_eq!(
            span.attrib_span("entity", " "),
            Err(SpanError::UnknownAttribute("entity".to_string()))
        );
    }

    #[test]
    fn test_containment() {
        let unit = cat_unit();
        let outer = Span::new(Arc::clone(&unit), 4, 10).unwrap();
        let inner = Span::new(Arc::clone(&unit), 8, 10).unwrap();
        // Reflexive
        assert!(outer.contains(&outer));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        // Mutual containment forces equal ranges
        let same = Span::new(Arc::clone(&unit), 4, 10).unwrap();
        assert!(outer.contains(&same) && same.contains(&outer));
        assert_eq!(outer.char_start(), same.char_start());
        assert_eq!(outer.char_end(), same.char_end());
    }

    #[test]
    fn test_slice_identity() {
        let span = Span::new(cat_unit(), 4, 10).unwrap();
        let sliced = span.slice(None, None).unwrap();
        assert_eq!(sliced, span);
        assert!(sliced.same_unit(&span));
    }

    #[test]
    fn test_slice_negative_stop() {
        let span = Span::new(cat_unit(), 4, 10).unwrap();
        // -1 drops exactly the last character
        let trimmed = span.slice(None, Some(-1)).unwrap();
        assert_eq!(trimmed.char_start(), 4);
        assert_eq!(trimmed.char_end(), 9);
        // The worked example: stop=-4 leaves "cat"
        let cat = span.slice(None, Some(-4)).unwrap();
        assert_eq!((cat.char_start(), cat.char_end()), (4, 6));
        assert_eq!(cat.span_text(), "cat");
    }

    #[test]
    fn test_slice_positive_stop_is_exclusive() {
        let span = Span::new(cat_unit(), 4, 10).unwrap();
        // stop counts characters from the span's own start
        let cat = span.slice(None, Some(3)).unwrap();
        assert_eq!(cat.span_text(), "cat");
        let sat = span.slice(Some(4), Some(7)).unwrap();
        assert_eq!(sat.span_text(), "sat");
    }

    #[test]
    fn test_slice_result_is_transient_without_metadata() {
        let span = Span::new(cat_unit(), 4, 10)
            .unwrap()
            .with_metadata(serde_json::json!({"source": "pattern-7"}));
        let mut ids = SequentialIds::default();
        let persisted = span.promote(&mut ids);
        let sliced = persisted.slice(None, Some(-4)).unwrap();
        assert_eq!(sliced.identity(), Identity::Transient);
        assert!(sliced.metadata().is_none());
    }

    #[test]
    fn test_slice_rejects_step_and_empty_result() {
        let span = Span::new(cat_unit(), 4, 10).unwrap();
        assert_eq!(
            span.slice_with(SliceRequest {
                start: None,
                stop: None,
                step: Some(2),
            }),
            Err(SpanError::UnsupportedSlice)
        );
        // stop=0 resolves to an empty range
        assert!(matches!(
            span.slice(None, Some(0)),
            Err(SpanError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_structural_equality_for_transient_spans() {
        let unit = cat_unit();
        let a = Span::new(Arc::clone(&unit), 4, 10).unwrap();
        let b = Span::new(Arc::clone(&unit), 4, 10).unwrap();
        let c = Span::new(Arc::clone(&unit), 4, 6).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        // Same text, different unit instance: not equal
        let other_unit = cat_unit();
        let d = Span::new(other_unit, 4, 10).unwrap();
        assert_ne!(a, d);
    }

    #[test]
    fn test_persisted_equality_is_by_identity() {
        let unit = cat_unit();
        let span = Span::new(Arc::clone(&unit), 4, 10).unwrap();
        let mut ids = SequentialIds::default();
        let first = span.promote(&mut ids);
        let second = span.promote(&mut ids);
        // Same content, distinct identities
        assert_ne!(first, second);
        assert_eq!(first.char_start(), second.char_start());
        assert_eq!(first.char_end(), second.char_end());
        // Persisted vs transient falls back to structural comparison
        assert_eq!(first, span);
    }

    #[test]
    fn test_promotion_preserves_content() {
        let unit = cat_unit();
        let meta = serde_json::json!({"rule": "np-chunk"});
        let span = Span::new(Arc::clone(&unit), 4, 10)
            .unwrap()
            .with_metadata(meta.clone());
        let mut ids = SequentialIds::default();
        let persisted = span.promote(&mut ids);
        assert!(persisted.is_persisted());
        assert!(persisted.same_unit(&span));
        assert_eq!(persisted.char_start(), 4);
        assert_eq!(persisted.char_end(), 10);
        assert_eq!(persisted.metadata(), Some(&meta));
    }

    #[test]
    fn test_debug_rendering() {
        let span = Span::new(cat_unit(), 4, 10).unwrap();
        assert_eq!(format!("{:?}", span), "Span(\"cat sat\", chars=[4,10], words=[1,2])");
    }
}
