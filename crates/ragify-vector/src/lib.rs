//! Vector search infrastructure for Ragify.
//!
//! This crate provides the exact flat vector index and the embedding
//! provider abstraction consumed by the knowledge base.
//!
//! # Features
//!
//! - `embed-fastembed`: Enable local embedding generation via fastembed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ragify-vector                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait                                    │
//! │  ├── HashEmbeddingProvider (always available)               │
//! │  └── FastEmbedProvider (feature: embed-fastembed)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FlatIndex (exact squared-L2 k-NN, append-only slots)       │
//! │  Persistence (rkyv snapshot + blake3 checksum)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use ragify_vector::FlatIndex;
//!
//! let mut index = FlatIndex::in_memory(3).unwrap();
//! let slot = index.add(&[0.0, 3.0, 4.0]).unwrap();
//! let hits = index.search(&[0.0, 0.6, 0.8], 1).unwrap();
//! assert_eq!(hits[0].slot, Some(slot));
//! ```

pub mod distance;
pub mod embedding;
pub mod index;
pub mod persistence;
pub mod types;

#[cfg(feature = "embed-fastembed")]
pub mod fastembed;

// Re-exports: core types
pub use index::FlatIndex;
pub use types::Neighbor;

// Re-exports: traits and providers
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider};

#[cfg(feature = "embed-fastembed")]
pub use fastembed::FastEmbedProvider;
