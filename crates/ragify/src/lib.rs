//! Ragify: semantic search over a small document collection.
//!
//! Documents are embedded by an injected [`EmbeddingProvider`], their
//! vectors appended to an exact [`FlatIndex`], and their records kept in a
//! [`DocumentStore`] keyed by id and vector slot. [`KnowledgeBase`] keeps
//! the two stores consistent and is the whole public surface: add, search,
//! bulk ingest, load from a [`DocumentSource`], and clear.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ragify::{HashEmbeddingProvider, KnowledgeBase};
//! use serde_json::json;
//!
//! # async fn demo() -> ragify::Result<()> {
//! let provider = Arc::new(HashEmbeddingProvider::new(384));
//! let kb = KnowledgeBase::open("data/documents.redb", "data/vectors.idx", provider)?;
//!
//! kb.add_document("intro", "Ragify keeps vectors and records in step", json!({}))
//!     .await?;
//! for hit in kb.search("how are records kept consistent?", 3).await? {
//!     println!("{:.3} {}", hit.similarity_score, hit.original_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod knowledge_base;
pub mod pptx;
pub mod source;

pub use knowledge_base::{
    DEFAULT_SEARCH_LIMIT, IngestReport, KnowledgeBase, KnowledgeBaseStats, SearchResult,
    similarity_score,
};
pub use pptx::PptxDirectorySource;
pub use source::{DocumentSource, SourceDocument, StaticSource};

// Re-exports from the component crates
pub use ragify_core::{ConfigProvider, Error, Result, Slot};
pub use ragify_store::{DocumentRecord, DocumentStore, Metadata};
pub use ragify_vector::{EmbeddingProvider, FlatIndex, HashEmbeddingProvider, Neighbor};

#[cfg(feature = "embed-fastembed")]
pub use ragify_vector::FastEmbedProvider;
