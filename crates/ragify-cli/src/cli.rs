//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

/// Top-level arguments for the `ragify` binary.
#[derive(Parser, Debug)]
#[command(name = "ragify", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "RAGIFY_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Knowledge base commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add one document.
    Add {
        /// Unique document id.
        id: String,

        /// Document text.
        text: String,

        /// Metadata as a JSON object.
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Find the documents most similar to a query.
    Search {
        /// Query text.
        query: String,

        /// Number of results (defaults to `search.default_limit`).
        #[arg(short = 'k', long = "limit")]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ingest every slide of the `.pptx` decks in a directory.
    Load {
        /// Deck directory (defaults to `ingest.pptx_dir`).
        dir: Option<String>,
    },

    /// Remove every document and vector.
    Clear,

    /// Show document and vector counts.
    Stats,

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,

    /// Print one configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "search.default_limit").
        key: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}
