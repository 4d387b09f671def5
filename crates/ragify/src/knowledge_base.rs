//! The knowledge base: a vector index and a document store kept in step.
//!
//! Every document record references exactly one live vector slot and every
//! referenced slot has exactly one record. The one tolerated exception is an
//! orphan vector left behind when a document commit fails after its vector
//! was appended; search joins through the document store, so orphans are
//! never returned.
//!
//! # Locking
//!
//! Both stores sit behind a single `RwLock`. Adds and clears take the write
//! lock for their whole duration; searches and stats share the read lock.

use std::path::PathBuf;
use std::sync::Arc;

use ragify_core::{ConfigProvider, Result, Slot};
use ragify_store::{DocumentRecord, DocumentStore, Metadata};
use ragify_vector::{EmbeddingProvider, FlatIndex};
use serde::Serialize;
use serde_json::Map;
use tokio::sync::RwLock;

use crate::source::{DocumentSource, SourceDocument};

/// Default number of results returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 3;

/// Ranking score for a squared-L2 distance: `1 / (1 + distance)`.
///
/// Lies in `(0, 1]` and decreases as the distance grows. It orders results;
/// it is not a calibrated probability.
pub fn similarity_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// The document's id.
    pub original_id: String,

    /// The document's text.
    pub content: String,

    /// The document's metadata, as stored.
    pub metadata: Metadata,

    /// `1 / (1 + distance)`.
    pub similarity_score: f32,

    /// Squared L2 distance between the unit query and document vectors.
    pub distance: f32,

    /// Slot of the document's vector.
    pub vector_slot: Slot,
}

/// Outcome of a bulk ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents offered.
    pub attempted: usize,

    /// Documents added.
    pub added: usize,

    /// Documents refused (duplicate id or non-object metadata).
    pub rejected: usize,

    /// Documents whose add returned an error.
    pub failed: usize,
}

/// Counters describing a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseStats {
    /// Stored document records.
    pub documents: usize,

    /// Vectors in the index.
    pub vectors: usize,

    /// Vectors no document references.
    pub orphaned_vectors: usize,

    /// Vector dimension.
    pub dimension: usize,

    /// Embedding provider name.
    pub provider: String,
}

struct Stores {
    index: FlatIndex,
    documents: DocumentStore,
}

/// Semantic search over a set of documents.
pub struct KnowledgeBase {
    stores: RwLock<Stores>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl KnowledgeBase {
    /// Open (or create) a knowledge base from its two files.
    ///
    /// The index dimension is taken from `provider`; an index file built
    /// with another dimension, or one that cannot be read, is an error and
    /// nothing is touched. If the document store references slots the index
    /// does not have (the index file was missing or failed validation),
    /// those records are removed with a warning so every remaining record
    /// points at a live vector.
    pub fn open(
        documents_path: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let index = FlatIndex::open(index_path, provider.dimension())?;
        let documents = DocumentStore::open(documents_path)?;

        if let Some(max_slot) = documents.max_slot()?
            && max_slot >= index.next_slot()
        {
            let removed = documents.remove_from_slot(index.next_slot())?;
            log::warn!(
                "Removed {removed} documents whose vectors are missing from the index"
            );
        }

        log::info!(
            "Opened knowledge base ({} documents, {} vectors, provider {})",
            documents.len()?,
            index.len(),
            provider.name()
        );

        Ok(Self {
            stores: RwLock::new(Stores { index, documents }),
            provider,
        })
    }

    /// Open the knowledge base at the paths named by `config`.
    pub fn from_config<C: ConfigProvider>(
        config: &C,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        Self::open(config.documents_path()?, config.index_path()?, provider)
    }

    /// The embedding provider in use.
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Add one document.
    ///
    /// Returns `Ok(false)` without changing anything when `original_id` is
    /// already present or `metadata` is neither an object nor null (null is
    /// stored as `{}`). Embedding and storage failures are errors.
    ///
    /// If the vector was appended but the document commit then fails, the
    /// vector stays behind as an orphan and the error is returned.
    pub async fn add_document(
        &self,
        original_id: &str,
        content: &str,
        metadata: Metadata,
    ) -> Result<bool> {
        let metadata = match metadata {
            Metadata::Null => Metadata::Object(Map::new()),
            Metadata::Object(_) => metadata,
            other => {
                log::warn!(
                    "Rejected document {original_id}: metadata must be an object, got {other}"
                );
                return Ok(false);
            }
        };

        let mut stores = self.stores.write().await;

        if stores.documents.contains(original_id)? {
            log::warn!("Rejected document {original_id}: id already present");
            return Ok(false);
        }

        let embedding = self.provider.embed(content).await?;
        log::debug!("Generated embedding for document {original_id}");

        let slot = stores.index.next_slot();
        let Some(staged) = stores
            .documents
            .begin_add(original_id, content, &metadata, slot)?
        else {
            log::warn!("Rejected document {original_id}: id or slot {slot} already taken");
            return Ok(false);
        };

        match stores.index.add(&embedding) {
            Ok(added) => debug_assert_eq!(added, slot),
            Err(e) => {
                if let Err(abort) = staged.abort() {
                    log::warn!("Could not abort staged document {original_id}: {abort}");
                }
                return Err(e);
            }
        }
        log::debug!("Added embedding for {original_id} at slot {slot}");

        if let Err(e) = staged.commit() {
            log::error!("Document {original_id} not stored; vector at slot {slot} is orphaned: {e}");
            return Err(e);
        }

        log::info!("Added document {original_id}");
        Ok(true)
    }

    /// The `k` documents closest to `query`, best first.
    ///
    /// An empty knowledge base (or `k == 0`) yields no results, not an
    /// error. Embedding and storage failures are errors.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.provider.embed(query).await?;
        let stores = self.stores.read().await;
        if stores.index.is_empty() {
            return Ok(Vec::new());
        }
        let neighbors = stores.index.search(&embedding, k)?;

        let mut results = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            let Some(slot) = neighbor.slot else {
                continue;
            };
            match stores.documents.get_by_slot(slot)? {
                Some(record) => results.push(SearchResult {
                    original_id: record.original_id,
                    content: record.content,
                    metadata: record.metadata,
                    similarity_score: similarity_score(neighbor.distance),
                    distance: neighbor.distance,
                    vector_slot: slot,
                }),
                None => log::debug!("Skipping orphaned vector at slot {slot}"),
            }
        }

        log::debug!("Search returned {} results (k={k})", results.len());
        Ok(results)
    }

    /// Look up a document by id.
    pub async fn get_document(&self, original_id: &str) -> Result<Option<DocumentRecord>> {
        let stores = self.stores.read().await;
        stores.documents.get(original_id)
    }

    /// Remove every document and vector. Idempotent.
    pub async fn clear_knowledge_base(&self) -> Result<()> {
        let mut stores = self.stores.write().await;
        stores.documents.clear()?;
        stores.index.clear()?;
        log::info!("Cleared knowledge base");
        Ok(())
    }

    /// Add each document in order, continuing past rejections and errors.
    pub async fn bulk_ingest(
        &self,
        documents: impl IntoIterator<Item = SourceDocument>,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        for doc in documents {
            report.attempted += 1;
            match self
                .add_document(&doc.original_id, &doc.content, doc.metadata)
                .await
            {
                Ok(true) => report.added += 1,
                Ok(false) => report.rejected += 1,
                Err(e) => {
                    log::error!("Error adding document {}: {e}", doc.original_id);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Ingested {} of {} documents ({} rejected, {} failed)",
            report.added,
            report.attempted,
            report.rejected,
            report.failed
        );
        report
    }

    /// Collect documents from `source` and ingest them.
    ///
    /// Only a failure of the source itself is an error.
    pub async fn load_documents_from(&self, source: &dyn DocumentSource) -> Result<IngestReport> {
        let documents = source.documents().await?;
        log::info!(
            "Loading {} documents from {} source",
            documents.len(),
            source.name()
        );
        Ok(self.bulk_ingest(documents).await)
    }

    /// Current counters.
    pub async fn stats(&self) -> Result<KnowledgeBaseStats> {
        let stores = self.stores.read().await;
        let documents = stores.documents.len()?;
        let vectors = stores.index.len();
        Ok(KnowledgeBaseStats {
            documents,
            vectors,
            orphaned_vectors: vectors.saturating_sub(documents),
            dimension: stores.index.dimension(),
            provider: self.provider.name().to_string(),
        })
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("provider", &self.provider.name())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
