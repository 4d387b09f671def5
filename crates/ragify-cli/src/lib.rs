//! Command-line interface for Ragify knowledge bases.
//!
//! ```text
//! ragify [--config PATH] [-v|-q] <command>
//!
//!   add <ID> <TEXT> [--metadata JSON]
//!   search <QUERY> [-k N] [--json]
//!   load [DIR]
//!   clear
//!   stats
//!   version
//!   config path | show | get <KEY> | init [--file F] [--force]
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod kb_handlers;

pub use app::RagifyCli;
pub use cli::CliArgs;
pub use config::RagifyConfig;
