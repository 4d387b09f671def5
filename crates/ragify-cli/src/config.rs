//! Configuration for the `ragify` CLI.
//!
//! [`RagifyConfig`] loads from a TOML file, `RAGIFY_*` environment
//! variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `RAGIFY_CONFIG` environment variable
//! 3. XDG default: `~/.config/ragify/config.toml`
//! 4. Built-in defaults
//!
//! Environment variables named `RAGIFY_<SECTION>_<KEY>` override file
//! values, e.g. `RAGIFY_EMBEDDING_PROVIDER=fastembed`.

use std::path::PathBuf;

use confyg::{Confygery, env};
use ragify::DEFAULT_SEARCH_LIMIT;
use ragify_core::traits::ConfigProvider;
use ragify_core::{Error, Result, expand_tilde};
use serde::{Deserialize, Deserializer, Serialize};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RAGIFY";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the `ragify` CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagifyConfig {
    /// Project name, used for env var prefixes and default paths.
    pub project_name: String,

    /// Directory holding the document store and the vector index.
    pub data_dir: String,

    /// File names inside `data_dir`.
    pub storage: StorageConfig,

    /// Embedding provider selection.
    pub embedding: EmbeddingConfig,

    /// Search defaults.
    pub search: SearchConfig,

    /// Ingestion defaults.
    pub ingest: IngestConfig,
}

/// Storage file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Document store file.
    pub documents_file: String,

    /// Vector index file.
    pub index_file: String,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider: "hash" or "fastembed".
    pub provider: String,

    /// Model name for the fastembed provider.
    pub model: String,

    /// Vector dimension for the hash provider.
    #[serde(deserialize_with = "lenient_usize")]
    pub dimension: usize,

    /// Model cache directory for the fastembed provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when `-k` is not given.
    #[serde(deserialize_with = "lenient_usize")]
    pub default_limit: usize,
}

/// Ingestion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory scanned by `ragify load` when none is given.
    pub pptx_dir: String,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for RagifyConfig {
    fn default() -> Self {
        Self {
            project_name: "ragify".to_string(),
            data_dir: "./data".to_string(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_file: ragify_core::traits::DEFAULT_DOCUMENTS_FILE.to_string(),
            index_file: ragify_core::traits::DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hash".to_string(),
            model: "all-minilm-l6-v2".to_string(),
            dimension: 384,
            cache_path: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            pptx_dir: "resources/pptx".to_string(),
        }
    }
}

/// Accept a number or a numeric string; environment overlays arrive as
/// strings.
fn lenient_usize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl RagifyConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        for section in ["storage", "embedding", "search", "ingest"] {
            env_opts.add_section(section);
        }
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("RAGIFY_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ragify").join("config.toml"))
    }

    /// Reject values no knowledge base can be opened with.
    pub fn validate(&self) -> Result<()> {
        match self.embedding.provider.as_str() {
            "hash" | "fastembed" => {}
            other => {
                return Err(Error::config(format!(
                    "Unknown embedding provider '{other}'. Supported: hash, fastembed"
                )));
            }
        }
        if self.embedding.dimension == 0 {
            return Err(Error::config("embedding.dimension must be positive"));
        }
        if self.storage.documents_file == self.storage.index_file {
            return Err(Error::config(
                "storage.documents_file and storage.index_file must differ",
            ));
        }
        Ok(())
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Directory scanned by `ragify load`, tilde-expanded.
    pub fn pptx_dir(&self) -> PathBuf {
        expand_tilde(&self.ingest.pptx_dir)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for RagifyConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn data_dir(&self) -> Result<PathBuf> {
        if self.data_dir.trim().is_empty() {
            return Err(Error::config("data_dir must not be empty"));
        }
        Ok(expand_tilde(&self.data_dir))
    }

    fn documents_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.storage.documents_file))
    }

    fn index_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.storage.index_file))
    }
}

// ============================================================================
// Tests
// ============================================================================
