//! The `ragify` application: logging, provider selection, dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use ragify::{EmbeddingProvider, HashEmbeddingProvider, KnowledgeBase};
use ragify_core::{Error, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};
use crate::config::{EmbeddingConfig, RagifyConfig};
use crate::{config_handlers, kb_handlers};

/// Build the embedding provider named by the configuration.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "hash" => Ok(Arc::new(HashEmbeddingProvider::new(config.dimension))),
        #[cfg(feature = "embed-fastembed")]
        "fastembed" => Ok(Arc::new(ragify::FastEmbedProvider::new(
            &config.model,
            config.cache_path.as_deref(),
        )?)),
        #[cfg(not(feature = "embed-fastembed"))]
        "fastembed" => Err(Error::config(
            "the fastembed provider needs a build with the `embed-fastembed` feature",
        )),
        other => Err(Error::config(format!("Unknown embedding provider '{other}'"))),
    }
}

/// The CLI application, holding the resolved configuration.
pub struct RagifyCli {
    config: RagifyConfig,
    version: String,
}

impl RagifyCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = RagifyConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create an application around an explicit configuration.
    pub fn new(config: RagifyConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The resolved configuration.
    pub fn config(&self) -> &RagifyConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` if set, otherwise defaults based on verbosity flags.
    /// Library crates log through `log`; the subscriber picks those records
    /// up as well.
    pub fn init_logging(verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Open the knowledge base described by the configuration.
    pub fn open_knowledge_base(&self) -> Result<KnowledgeBase> {
        let provider = build_provider(&self.config.embedding)?;
        tracing::debug!(provider = provider.name(), "embedding provider ready");
        KnowledgeBase::from_config(&self.config, provider)
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        Self::init_logging(args.verbose, args.quiet);

        let Some(command) = args.command else {
            println!("ragify {} (use --help for usage)", self.version);
            return Ok(());
        };

        match command {
            Command::Version => {
                println!("ragify {}", self.version);
                Ok(())
            }
            Command::Config(config_cmd) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            Command::Add { id, text, metadata } => {
                let kb = self.open_knowledge_base()?;
                kb_handlers::handle_add(&kb, &id, &text, metadata.as_deref()).await?;
                Ok(())
            }
            Command::Search { query, limit, json } => {
                let kb = self.open_knowledge_base()?;
                let limit = limit.unwrap_or(self.config.search.default_limit);
                kb_handlers::handle_search(&kb, &query, limit, json).await?;
                Ok(())
            }
            Command::Load { dir } => {
                let kb = self.open_knowledge_base()?;
                let dir = dir.map(PathBuf::from).unwrap_or_else(|| self.config.pptx_dir());
                kb_handlers::handle_load(&kb, &dir).await?;
                Ok(())
            }
            Command::Clear => {
                let kb = self.open_knowledge_base()?;
                kb_handlers::handle_clear(&kb).await
            }
            Command::Stats => {
                let kb = self.open_knowledge_base()?;
                kb_handlers::handle_stats(&kb).await?;
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::ENV_LOCK;
    use clap::Parser;
    use ragify_core::ConfigProvider;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, RagifyCli) {
        let dir = TempDir::new().unwrap();
        let mut config = RagifyConfig {
            data_dir: dir.path().join("data").to_string_lossy().into_owned(),
            ..Default::default()
        };
        config.embedding.dimension = 64;
        config.ingest.pptx_dir = dir.path().join("decks").to_string_lossy().into_owned();
        (dir, RagifyCli::new(config))
    }

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("ragify").chain(argv.iter().copied()))
    }

    #[test]
    fn test_build_provider_hash() {
        let config = EmbeddingConfig {
            dimension: 16,
            ..Default::default()
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "hash");
        assert_eq!(provider.dimension(), 16);
    }

    #[test]
    fn test_build_provider_unknown() {
        let config = EmbeddingConfig {
            provider: "word2vec".into(),
            ..Default::default()
        };
        assert!(build_provider(&config).is_err());
    }

    #[cfg(not(feature = "embed-fastembed"))]
    #[test]
    fn test_build_provider_fastembed_without_feature() {
        let config = EmbeddingConfig {
            provider: "fastembed".into(),
            ..Default::default()
        };
        let err = build_provider(&config).err().unwrap();
        assert!(err.to_string().contains("embed-fastembed"));
    }

    #[tokio::test]
    async fn test_run_version_and_no_command() {
        let (_dir, app) = test_app();
        assert!(app.run(args(&["version"])).await.is_ok());
        assert!(app.run(args(&[])).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_knowledge_base_commands() {
        let (_dir, app) = test_app();

        app.run(args(&["add", "d1", "onboarding checklist", "-m", r#"{"team":"eng"}"#]))
            .await
            .unwrap();
        app.run(args(&["add", "d2", "holiday schedule"]))
            .await
            .unwrap();
        app.run(args(&["search", "checklist", "-k", "1"]))
            .await
            .unwrap();
        app.run(args(&["search", "holiday", "--json"]))
            .await
            .unwrap();
        app.run(args(&["load"])).await.unwrap();
        app.run(args(&["stats"])).await.unwrap();

        let kb = app.open_knowledge_base().unwrap();
        let stats = kb.stats().await.unwrap();
        assert_eq!((stats.documents, stats.vectors), (2, 2));
        assert_eq!(stats.dimension, 64);
        drop(kb);

        app.run(args(&["clear"])).await.unwrap();
        let kb = app.open_knowledge_base().unwrap();
        assert_eq!(kb.stats().await.unwrap().documents, 0);
    }

    #[tokio::test]
    async fn test_run_add_bad_metadata_is_error() {
        let (_dir, app) = test_app();
        assert!(
            app.run(args(&["add", "d1", "text", "--metadata", "nope"]))
                .await
                .is_err()
        );
    }

    #[test]
    fn test_open_knowledge_base_uses_config_paths() {
        let (_dir, app) = test_app();
        let kb = app.open_knowledge_base().unwrap();
        drop(kb);
        assert!(app.config().documents_path().unwrap().exists());
    }

    #[test]
    fn test_from_args_with_file() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "project_name = \"from-file\"\n").unwrap();

        let cli_args = args(&["--config", path.to_str().unwrap(), "stats"]);
        let app = RagifyCli::from_args(&cli_args).unwrap();
        assert_eq!(app.config().project_name, "from-file");
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        RagifyCli::init_logging(false, false);
        RagifyCli::init_logging(true, false);
        RagifyCli::init_logging(false, true);
    }
}
