//! Error types for Ragify operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Ragify crates. Uses `thiserror` for derive macros.
//!
//! The variants follow the failure taxonomy of the knowledge base: storage
//! and I/O failures, embedding failures, and caller errors (dimension
//! mismatches, invalid data). Validation outcomes such as a duplicate
//! document id are *not* errors; they are reported as `Ok(false)`.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in Ragify operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoPath {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Parse failure (source documents, persisted state).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The embedding provider failed to produce a vector.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The document store failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A vector did not have the index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension fixed at index construction.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// Generic operation failure.
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Wrap an I/O error.
    pub fn io(err: impl Into<std::io::Error>) -> Self {
        Self::Io(err.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error for a named kind of thing.
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} '{id}'"))
    }

    /// Create a not found error from a free-form message.
    pub fn not_found_msg(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an embedding error.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error came from durable storage (document store, index file).
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_) | Self::IoPath { .. })
    }

    /// Whether this error came from the embedding provider.
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Ragify's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing data_dir");
        assert_eq!(err.to_string(), "Configuration error: missing data_dir");

        let err = Error::DimensionMismatch {
            expected: 384,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 384, got 3");
    }

    #[test]
    fn test_not_found_formats_kind() {
        let err = Error::not_found("Document", "d1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: Document 'd1'");
    }

    #[test]
    fn test_io_with_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io_with_path(io, "/tmp/vectors.idx");
        assert!(err.is_storage());
        assert!(err.to_string().contains("/tmp/vectors.idx"));
    }

    #[test]
    fn test_inspectors() {
        assert!(Error::storage("disk full").is_storage());
        assert!(Error::embedding("model offline").is_embedding());
        assert!(!Error::embedding("model offline").is_storage());
    }

    #[test]
    fn test_from_serde_json() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
