//! Ragify Core: shared errors, traits, and utilities.
//!
//! This crate provides the foundational types used across all Ragify crates.
//! It has no internal Ragify dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: Configuration trait consumed by the knowledge base
//! - [`types`]: Shared primitive types
//! - [`util`]: Identifier and path utilities

pub mod error;
pub mod traits;
pub mod types;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::ConfigProvider;
pub use types::Slot;

// Convenience re-exports from util
pub use util::ids::{id_from_path, slide_id};
pub use util::paths::{ensure_parent_dir, expand_tilde};
