//! Utility modules for identifiers and path handling.
//!
//! # Modules
//!
//! - [`ids`]: Document identifier helpers
//! - [`paths`]: Path resolution helpers (tilde expansion, directory setup)

pub mod ids;
pub mod paths;
