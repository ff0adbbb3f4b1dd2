//! The addressable content hierarchy: documents, sentences, corpora.
//!
//! Everything candidates are composed from is a "context": a document, one
//! of its sentences, or a persisted span. Contexts carry a durable
//! [`ContextId`] assigned at registration time and a human-readable stable
//! id derived from their position in the hierarchy. The variant set is
//! closed; there is no open-ended subtyping.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{SpanError, SpanResult};
use crate::span::{Identity, Span};
use crate::unit::TokenizedUnit;

/// Durable identifier for a registered context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator over the closed set of context kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    Document,
    Sentence,
    Span,
}

impl ContextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Document => "document",
            ContextKind::Sentence => "sentence",
            ContextKind::Span => "span",
        }
    }
}

/// A borrowed view over any context, for code that works across kinds.
#[derive(Debug, Clone, Copy)]
pub enum ContextRef<'a> {
    Document(&'a Document),
    Sentence(&'a Sentence),
    Span(&'a Span),
}

impl<'a> ContextRef<'a> {
    pub fn kind(&self) -> ContextKind {
        match self {
            ContextRef::Document(_) => ContextKind::Document,
            ContextRef::Sentence(_) => ContextKind::Sentence,
            ContextRef::Span(_) => ContextKind::Span,
        }
    }

    /// The context's durable identity, when it has one.
    ///
    /// Documents and sentences always do; spans only after promotion.
    pub fn id(&self) -> Option<ContextId> {
        match self {
            ContextRef::Document(doc) => Some(doc.id()),
            ContextRef::Sentence(sentence) => Some(sentence.id()),
            ContextRef::Span(span) => match span.identity() {
                Identity::Persisted(id) => Some(id),
                Identity::Transient => None,
            },
        }
    }
}

/// A root context: a named document with opaque metadata and ordered
/// sentences.
#[derive(Debug, Clone)]
pub struct Document {
    id: ContextId,
    name: String,
    meta: Option<serde_json::Value>,
    sentences: Vec<Sentence>,
}

impl Document {
    pub(crate) fn new(id: ContextId, name: String, meta: Option<serde_json::Value>) -> Self {
        Self {
            id,
            name,
            meta,
            sentences: Vec::new(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentence_at(&self, position: usize) -> Option<&Sentence> {
        self.sentences
            .iter()
            .find(|sentence| sentence.position() == position)
    }

    /// Stable id of the form `document:<name>`.
    pub fn stable_id(&self) -> String {
        format!("document:{}", self.name)
    }

    pub(crate) fn push_sentence(&mut self, sentence: Sentence) -> SpanResult<()> {
        if self.sentence_at(sentence.position()).is_some() {
            return Err(SpanError::DuplicatePosition {
                document: self.name.clone(),
                position: sentence.position(),
            });
        }
        self.sentences.push(sentence);
        Ok(())
    }
}

/// One sentence of a document: a position plus its tokenized unit.
#[derive(Debug, Clone)]
pub struct Sentence {
    id: ContextId,
    document: String,
    position: usize,
    unit: Arc<TokenizedUnit>,
}

impl Sentence {
    pub(crate) fn new(
        id: ContextId,
        document: String,
        position: usize,
        unit: Arc<TokenizedUnit>,
    ) -> Self {
        Self {
            id,
            document,
            position,
            unit,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn document_name(&self) -> &str {
        &self.document
    }

    /// Zero-based position within the owning document.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn unit(&self) -> &Arc<TokenizedUnit> {
        &self.unit
    }

    pub fn text(&self) -> &str {
        self.unit.text()
    }

    /// Stable id of the form `document:<name>::sentence:<position>`.
    pub fn stable_id(&self) -> String {
        format!("document:{}::sentence:{}", self.document, self.position)
    }
}

/// A named set of documents.
///
/// Membership is many-to-many: a document may belong to any number of
/// corpora, so subsets and supersets are cheap to build. Iteration follows
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    name: String,
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl Corpus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordered: Vec::new(),
            members: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a document by name. Returns false when it was already a member.
    pub fn add(&mut self, document: impl Into<String>) -> bool {
        let document = document.into();
        if self.members.insert(document.clone()) {
            self.ordered.push(document);
            true
        } else {
            false
        }
    }

    /// Remove a document by name. Returns false when it was not a member.
    pub fn remove(&mut self, document: &str) -> bool {
        if self.members.remove(document) {
            self.ordered.retain(|name| name != document);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, document: &str) -> bool {
        self.members.contains(document)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Document names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    /// Build a new corpus holding every member of either input.
    pub fn union(&self, other: &Corpus, name: impl Into<String>) -> Corpus {
        let mut merged = Corpus::new(name);
        for document in self.iter().chain(other.iter()) {
            merged.add(document);
        }
        merged
    }

    /// Build a new corpus holding only members of both inputs.
    pub fn intersection(&self, other: &Corpus, name: impl Into<String>) -> Corpus {
        let mut shared = Corpus::new(name);
        for document in self.iter().filter(|name| other.contains(name)) {
            shared.add(document);
        }
        shared
    }
}
