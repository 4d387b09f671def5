//! Path resolution utilities.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Expands `~` to the user's home directory.
///
/// If the path starts with `~`, replaces it with the user's home directory.
/// Otherwise returns the path unchanged.
///
/// # Example
///
/// ```
/// use ragify_core::util::paths::expand_tilde;
///
/// let expanded = expand_tilde("/var/lib/ragify");
/// assert_eq!(expanded, std::path::PathBuf::from("/var/lib/ragify"));
/// ```
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Make sure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))
        }
        _ => Ok(()),
    }
}
