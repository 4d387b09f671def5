//! Document sources for bulk ingestion.
//!
//! A [`DocumentSource`] produces the `(original_id, content, metadata)`
//! triples that [`KnowledgeBase::load_documents_from`] feeds through
//! `add_document`. Sources only read; they never touch the knowledge base.
//!
//! [`KnowledgeBase::load_documents_from`]: crate::KnowledgeBase::load_documents_from

use async_trait::async_trait;
use ragify_core::Result;
use ragify_store::Metadata;
use serde::{Deserialize, Serialize};

/// A document ready to be added to a knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Stable identifier, unique within the knowledge base.
    pub original_id: String,

    /// Text to embed and store.
    pub content: String,

    /// Structured metadata; a JSON object (or null for none).
    #[serde(default)]
    pub metadata: Metadata,
}

impl SourceDocument {
    /// Create a document with empty object metadata.
    pub fn new(original_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            original_id: original_id.into(),
            content: content.into(),
            metadata: Metadata::Object(Default::default()),
        }
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Trait for anything that can yield documents to ingest.
///
/// A failure to enumerate the source as a whole is an error. Sources that
/// read many files should skip (and log) individual bad files instead.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Collect every document this source provides, in ingestion order.
    async fn documents(&self) -> Result<Vec<SourceDocument>>;

    /// The source name for logging.
    fn name(&self) -> &str;
}

/// An in-memory list of documents.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: Vec<SourceDocument>,
}

impl StaticSource {
    /// Wrap a list of documents.
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self { documents }
    }
}

impl From<Vec<SourceDocument>> for StaticSource {
    fn from(documents: Vec<SourceDocument>) -> Self {
        Self::new(documents)
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn documents(&self) -> Result<Vec<SourceDocument>> {
        Ok(self.documents.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[async_trait]
impl DocumentSource for Vec<SourceDocument> {
    async fn documents(&self) -> Result<Vec<SourceDocument>> {
        Ok(self.clone())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
