//! Embedding provider trait and the built-in hashing provider.
//!
//! This module defines the `EmbeddingProvider` trait that abstracts over
//! different embedding generation backends. The knowledge base treats the
//! provider as a black box: `embed(text)` returns a vector whose length is
//! fixed at construction.
//!
//! # Providers
//!
//! - `HashEmbeddingProvider`: Deterministic offline vectors from hashed tokens
//! - `FastEmbedProvider`: Local transformer models (requires `embed-fastembed` feature)

use async_trait::async_trait;
use ragify_core::{Error, Result};

/// Trait for generating text embeddings.
///
/// Implementations wrap specific embedding libraries and provide a uniform
/// async interface. The trait requires `Send + Sync` to allow safe sharing
/// across async tasks.
///
/// Implementations must be deterministic for a fixed model: embedding the
/// same text twice yields the same vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// Weight of a whole-word feature.
const WORD_WEIGHT: f32 = 1.0;

/// Weight of a character trigram feature.
const TRIGRAM_WEIGHT: f32 = 0.5;

/// A deterministic embedding provider that needs no model download.
///
/// Lowercased word tokens and their character trigrams are hashed with
/// blake3 into `dimension` signed buckets, and the result is unit-normalized.
/// Texts sharing vocabulary land close together; identical texts produce
/// identical vectors. Suitable for tests, demos, and small keyword-heavy
/// corpora.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    /// Create a new hashing provider with the given dimension (at least 1).
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hashed_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut features = 0usize;

        for word in tokenize(text) {
            self.accumulate(&mut embedding, word.as_bytes(), WORD_WEIGHT);
            features += 1;

            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut embedding, trigram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        if features == 0 {
            return Err(Error::embedding("text has no tokens to embed"));
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            // Every feature cancelled out; fall back to a single fixed bucket.
            embedding[0] = 1.0;
        } else {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        Ok(embedding)
    }

    fn accumulate(&self, embedding: &mut [f32], feature: &[u8], weight: f32) {
        let hash = blake3::hash(feature);
        let bytes = hash.as_bytes();

        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

        embedding[bucket] += sign * weight;
    }
}

/// Split text into lowercase alphanumeric tokens.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.hashed_embedding(text)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.hashed_embedding(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::squared_l2;

    #[test]
    fn test_hash_provider_creation() {
        let provider = HashEmbeddingProvider::new(384);
        assert_eq!(provider.dimension(), 384);
        assert_eq!(provider.name(), "hash");
    }

    #[test]
    fn test_hash_provider_zero_dimension_clamped() {
        assert_eq!(HashEmbeddingProvider::new(0).dimension(), 1);
    }

    #[tokio::test]
    async fn test_embed_single_is_unit_norm() {
        let provider = HashEmbeddingProvider::new(64);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 64);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_embed_deterministic() {
        let provider = HashEmbeddingProvider::new(32);
        let e1 = provider.embed("same text").await.unwrap();
        let e2 = provider.embed("same text").await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn test_embed_case_and_punctuation_insensitive() {
        let provider = HashEmbeddingProvider::new(32);
        let e1 = provider.embed("Quarterly Revenue!").await.unwrap();
        let e2 = provider.embed("quarterly revenue").await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let provider = HashEmbeddingProvider::new(256);
        let query = provider.embed("rust ownership rules").await.unwrap();
        let related = provider
            .embed("ownership and borrowing rules in rust")
            .await
            .unwrap();
        let unrelated = provider
            .embed("tomato soup with fresh basil")
            .await
            .unwrap();

        assert!(squared_l2(&query, &related) < squared_l2(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_embed_empty_text_fails() {
        let provider = HashEmbeddingProvider::new(8);
        let err = provider.embed("  ... ").await.unwrap_err();
        assert!(err.is_embedding());
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let provider = HashEmbeddingProvider::new(8);
        let embeddings = provider
            .embed_batch(&["hello", "world", "test"])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 3);
        for emb in &embeddings {
            assert_eq!(emb.len(), 8);
        }
    }

    #[tokio::test]
    async fn test_embed_batch_propagates_failure() {
        let provider = HashEmbeddingProvider::new(8);
        assert!(provider.embed_batch(&["fine", ""]).await.is_err());
    }

    #[test]
    fn test_tokenize() {
        let tokens: Vec<String> = tokenize("Slide 3: Q4-results, déjà vu").collect();
        assert_eq!(tokens, vec!["slide", "3", "q4", "results", "déjà", "vu"]);
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn EmbeddingProvider) {}
    }
}
