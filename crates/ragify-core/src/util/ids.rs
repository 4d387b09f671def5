//! Document identifier helpers.

use std::path::Path;

/// Derive a document id stem from a file path (the file name without extension).
///
/// Returns `None` when the path has no usable UTF-8 file stem.
pub fn id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Compose the id of one slide of a deck: `<stem>_slide_<n>`.
pub fn slide_id(stem: &str, slide_number: usize) -> String {
    format!("{stem}_slide_{slide_number}")
}
