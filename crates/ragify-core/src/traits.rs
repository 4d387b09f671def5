//! Core traits for Ragify.
//!
//! The primary trait is [`ConfigProvider`], which tells the knowledge base
//! where its two durable artifacts live.

use std::path::PathBuf;

use crate::Result;

/// Default file name for the document store inside the data directory.
pub const DEFAULT_DOCUMENTS_FILE: &str = "documents.redb";

/// Default file name for the vector index snapshot inside the data directory.
pub const DEFAULT_INDEX_FILE: &str = "vectors.idx";

/// Trait for application configuration consumed by the knowledge base.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use ragify_core::traits::ConfigProvider;
/// use ragify_core::Result;
///
/// #[derive(Clone)]
/// struct SlidesConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for SlidesConfig {
///     fn project_name(&self) -> &str {
///         "slides"
///     }
///
///     fn data_dir(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
/// }
///
/// let config = SlidesConfig { data_dir: PathBuf::from("/srv/slides") };
/// assert_eq!(
///     config.index_path().unwrap(),
///     PathBuf::from("/srv/slides/vectors.idx")
/// );
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Directory holding the document store and the index file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be determined.
    fn data_dir(&self) -> Result<PathBuf>;

    /// Path of the document store database.
    fn documents_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DEFAULT_DOCUMENTS_FILE))
    }

    /// Path of the persisted vector index.
    fn index_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DEFAULT_INDEX_FILE))
    }
}
