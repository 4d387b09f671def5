//! Document records.

use chrono::{DateTime, Utc};
use ragify_core::Slot;
use serde::{Deserialize, Serialize};

/// Arbitrary structured metadata attached to a document.
///
/// A tagged union of null, booleans, numbers, strings, arrays and objects.
/// Stored as JSON and returned exactly as given.
pub type Metadata = serde_json::Value;

/// A stored document and the vector slot that embeds it.
///
/// Records are created together with their vector, never updated in place,
/// and only removed by clearing the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Application-chosen identifier, unique across the store.
    pub original_id: String,

    /// The embedded text.
    pub content: String,

    /// Caller-supplied metadata.
    pub metadata: Metadata,

    /// Slot of the document's vector, unique across the store.
    pub vector_slot: Slot,

    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        original_id: impl Into<String>,
        content: impl Into<String>,
        metadata: Metadata,
        vector_slot: Slot,
    ) -> Self {
        Self {
            original_id: original_id.into(),
            content: content.into(),
            metadata,
            vector_slot,
            created_at: Utc::now(),
        }
    }
}
