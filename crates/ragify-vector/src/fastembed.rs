//! Local sentence embeddings through `fastembed`.
//!
//! The model's dimension fixes the dimension of the vector index it feeds.
//! An index file written with one model cannot be opened with a model of a
//! different dimension, so switching models means clearing the knowledge
//! base first.
//!
//! Requires the `embed-fastembed` feature.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use ragify_core::{Error, Result};

use crate::embedding::EmbeddingProvider;

/// Default model. Small enough to run on a laptop CPU, and the model the
/// stock configuration sizes its index for.
pub const DEFAULT_MODEL: &str = "all-minilm-l6-v2";

/// A model this provider can load.
#[derive(Debug, Clone)]
struct ModelSpec {
    name: &'static str,
    model: EmbeddingModel,
    dimension: usize,
}

/// Models accepted by [`FastEmbedProvider::new`], by configuration name.
const MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "all-minilm-l6-v2",
        model: EmbeddingModel::AllMiniLML6V2,
        dimension: 384,
    },
    ModelSpec {
        name: "bge-small-en-v1.5",
        model: EmbeddingModel::BGESmallENV15,
        dimension: 384,
    },
    ModelSpec {
        name: "bge-base-en-v1.5",
        model: EmbeddingModel::BGEBaseENV15,
        dimension: 768,
    },
];

fn model_spec(name: &str) -> Result<ModelSpec> {
    MODELS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| {
            let known: Vec<&str> = MODELS.iter().map(|spec| spec.name).collect();
            Error::config(format!(
                "Unknown embedding model '{name}' (known: {})",
                known.join(", ")
            ))
        })
}

/// Embedding provider backed by a locally cached `fastembed` model.
pub struct FastEmbedProvider {
    spec: ModelSpec,
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedProvider {
    /// Load `model_name`, downloading it into `cache_path` on first use.
    ///
    /// Blocks while the model loads. Fails if the loaded model's output
    /// size disagrees with its known dimension.
    pub fn new(model_name: &str, cache_path: Option<&str>) -> Result<Self> {
        let spec = model_spec(model_name)?;

        let mut options = InitOptions::new(spec.model.clone());
        if let Some(path) = cache_path {
            options = options.with_cache_dir(path.into());
        }
        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| Error::embedding(format!("Could not load {}: {e}", spec.name)))?;

        let check = model
            .embed(vec!["ragify"], None)
            .map_err(|e| Error::embedding(format!("{} failed its first embedding: {e}", spec.name)))?;
        let actual = check.first().map_or(0, Vec::len);
        if actual != spec.dimension {
            return Err(Error::DimensionMismatch {
                expected: spec.dimension,
                actual,
            });
        }

        log::info!("Loaded embedding model {} ({} dimensions)", spec.name, spec.dimension);
        Ok(Self {
            spec,
            model: Arc::new(Mutex::new(model)),
        })
    }

    async fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let name = self.spec.name;

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| Error::embedding(format!("{name} is unusable after a panic")))?;
            model
                .embed(texts, None)
                .map_err(|e| Error::embedding(format!("{name}: {e}")))
        })
        .await
        .map_err(|e| Error::embedding(format!("Embedding task for {name} did not finish: {e}")))?
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.run(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::embedding(format!("{} returned no vector", self.spec.name)))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.run(texts.iter().map(|t| t.to_string()).collect()).await?;
        if vectors.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} vectors for {} texts",
                self.spec.name,
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.spec.dimension
    }

    fn name(&self) -> &str {
        self.spec.name
    }
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &self.spec.name)
            .field("dimension", &self.spec.dimension)
            .finish()
    }
}
