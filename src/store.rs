//! Identity allocation and the in-memory span store.
//!
//! Promotion needs identities, and identities come from an allocator passed
//! in explicitly; there is no process-global counter. The store layers the
//! persistence invariants on top: unique document names, unique sentence
//! positions per document, and at most one identity per distinct
//! `(unit, char_start, char_end)` span triple.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::{ContextId, Corpus, Document, Sentence};
use crate::errors::{SpanError, SpanResult};
use crate::span::Span;
use crate::unit::TokenizedUnit;

/// Source of durable identities for promoted contexts.
pub trait IdentityAllocator {
    /// Hand out the next identity. Every call returns a fresh one.
    fn allocate(&mut self) -> ContextId;
}

/// Monotonic in-memory allocator starting at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u64,
}

impl IdentityAllocator for SequentialIds {
    fn allocate(&mut self) -> ContextId {
        self.next += 1;
        ContextId(self.next)
    }
}

/// Content key for span deduplication: the anchoring unit instance plus the
/// inclusive character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SpanKey {
    unit: usize,
    char_start: usize,
    char_end: usize,
}

impl SpanKey {
    fn of(span: &Span) -> Self {
        Self {
            unit: Arc::as_ptr(span.unit()) as usize,
            char_start: span.char_start(),
            char_end: span.char_end(),
        }
    }
}

/// In-memory registry for documents, sentences, corpora, and persisted
/// spans.
///
/// Documents and sentences get their identity at registration. Spans get
/// theirs at promotion; re-promoting an already-stored content triple
/// returns the existing persisted span rather than allocating again.
#[derive(Debug, Default)]
pub struct SpanStore<A = SequentialIds> {
    ids: A,
    documents: Vec<Document>,
    corpora: HashMap<String, Corpus>,
    // unit pointer -> stable id of the sentence anchoring it
    unit_anchors: HashMap<usize, String>,
    spans: HashMap<SpanKey, Span>,
}

impl SpanStore<SequentialIds> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A: IdentityAllocator> SpanStore<A> {
    /// Build a store around a caller-supplied identity allocator.
    pub fn with_allocator(ids: A) -> Self {
        Self {
            ids,
            documents: Vec::new(),
            corpora: HashMap::new(),
            unit_anchors: HashMap::new(),
            spans: HashMap::new(),
        }
    }

    /// Register a document under a unique name.
    pub fn add_document(
        &mut self,
        name: impl Into<String>,
        meta: Option<serde_json::Value>,
    ) -> SpanResult<ContextId> {
        let name = name.into();
        if self.document(&name).is_some() {
            return Err(SpanError::DuplicateName(name));
        }
        let id = self.ids.allocate();
        self.documents.push(Document::new(id, name, meta));
        Ok(id)
    }

    /// Register a sentence of `document` at `position`.
    ///
    /// The position must be free, and later span promotions over this unit
    /// will resolve their stable ids through it.
    pub fn add_sentence(
        &mut self,
        document: &str,
        position: usize,
        unit: Arc<TokenizedUnit>,
    ) -> SpanResult<ContextId> {
        let doc_index = self
            .documents
            .iter()
            .position(|doc| doc.name() == document)
            .ok_or_else(|| SpanError::UnknownDocument(document.to_string()))?;
        if self.documents[doc_index].sentence_at(position).is_some() {
            return Err(SpanError::DuplicatePosition {
                document: document.to_string(),
                position,
            });
        }
        let id = self.ids.allocate();
        let sentence = Sentence::new(id, document.to_string(), position, Arc::clone(&unit));
        let stable_id = sentence.stable_id();
        self.documents[doc_index].push_sentence(sentence)?;
        self.unit_anchors
            .insert(Arc::as_ptr(&unit) as usize, stable_id);
        Ok(id)
    }

    pub fn document(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.name() == name)
    }

    /// Registered documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Promote a span, deduplicating on its content triple.
    ///
    /// The first promotion of a given `(unit, char_start, char_end)`
    /// allocates an identity and records the persisted span; every later
    /// promotion of the same triple returns that same persisted span.
    pub fn promote(&mut self, span: &Span) -> Span {
        let key = SpanKey::of(span);
        if let Some(existing) = self.spans.get(&key) {
            return existing.clone();
        }
        let persisted = span.promote(&mut self.ids);
        self.spans.insert(key, persisted.clone());
        persisted
    }

    /// Look up the persisted span for a content triple, if one was promoted.
    pub fn persisted_span(
        &self,
        unit: &Arc<TokenizedUnit>,
        char_start: usize,
        char_end: usize,
    ) -> Option<&Span> {
        self.spans.get(&SpanKey {
            unit: Arc::as_ptr(unit) as usize,
            char_start,
            char_end,
        })
    }

    pub fn persisted_count(&self) -> usize {
        self.spans.len()
    }

    /// Stable id for a span over a registered sentence's unit, of the form
    /// `document:<name>::sentence:<position>::span:<start>-<end>`.
    ///
    /// None when the span's unit was never registered as a sentence.
    pub fn span_stable_id(&self, span: &Span) -> Option<String> {
        self.unit_anchors
            .get(&(Arc::as_ptr(span.unit()) as usize))
            .map(|anchor| {
                format!(
                    "{}::span:{}-{}",
                    anchor,
                    span.char_start(),
                    span.char_end()
                )
            })
    }

    /// Create an empty corpus under a unique name.
    pub fn create_corpus(&mut self, name: impl Into<String>) -> SpanResult<()> {
        let name = name.into();
        if self.corpora.contains_key(&name) {
            return Err(SpanError::DuplicateName(name));
        }
        self.corpora.insert(name.clone(), Corpus::new(name));
        Ok(())
    }

    /// Add a registered document to a corpus.
    ///
    /// Returns false when the document was already a member.
    pub fn add_to_corpus(&mut self, corpus: &str, document: &str) -> SpanResult<bool> {
        if self.document(document).is_none() {
            return Err(SpanError::UnknownDocument(document.to_string()));
        }
        let corpus = self
            .corpora
            .get_mut(corpus)
            .ok_or_else(|| SpanError::UnknownCorpus(corpus.to_string()))?;
        Ok(corpus.add(document))
    }

    pub fn corpus(&self, name: &str) -> Option<&Corpus> {
        self.corpora.get(name)
    }
}
