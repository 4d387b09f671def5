//! redb-backed document store.
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `documents` | `original_id` (str) | JSON-encoded [`DocumentRecord`] |
//! | `slots` | vector slot (u64) | `original_id` |
//!
//! The `slots` table is the unique secondary key on the vector slot. Both
//! tables are written in the same transaction, so a committed add is visible
//! in both or neither, and every commit is durable before it returns.

use std::path::{Path, PathBuf};

use ragify_core::{Error, Result, Slot, ensure_parent_dir};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};

use crate::document::{DocumentRecord, Metadata};

const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");
const SLOTS: TableDefinition<u64, &str> = TableDefinition::new("slots");

/// Map any redb error into a storage error.
fn db_err(err: impl Into<redb::Error>) -> Error {
    Error::storage(err.into().to_string())
}

/// Durable mapping from document id to content, metadata and vector slot.
pub struct DocumentStore {
    db: Database,
    path: PathBuf,
}

impl DocumentStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;

        let db = Database::create(&path).map_err(db_err)?;

        // Make sure both tables exist so read transactions can open them.
        let txn = db.begin_write().map_err(db_err)?;
        {
            txn.open_table(DOCUMENTS).map_err(db_err)?;
            txn.open_table(SLOTS).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;

        log::debug!("Opened document store at {}", path.display());
        Ok(Self { db, path })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a document, committing immediately.
    ///
    /// Returns `Ok(false)` without changing anything if `original_id` or
    /// `vector_slot` is already taken.
    pub fn add(
        &self,
        original_id: &str,
        content: &str,
        metadata: &Metadata,
        vector_slot: Slot,
    ) -> Result<bool> {
        match self.begin_add(original_id, content, metadata, vector_slot)? {
            Some(staged) => {
                staged.commit()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Write a document inside an open transaction without committing it.
    ///
    /// Returns `Ok(None)` if `original_id` or `vector_slot` is already taken;
    /// the transaction is aborted and nothing changes. Otherwise the returned
    /// [`StagedInsert`] holds the store's write transaction until it is
    /// committed or dropped (dropping aborts).
    pub fn begin_add(
        &self,
        original_id: &str,
        content: &str,
        metadata: &Metadata,
        vector_slot: Slot,
    ) -> Result<Option<StagedInsert>> {
        let record = DocumentRecord::new(original_id, content, metadata.clone(), vector_slot);
        let bytes = serde_json::to_vec(&record)?;

        let txn = self.db.begin_write().map_err(db_err)?;
        let conflict = {
            let mut documents = txn.open_table(DOCUMENTS).map_err(db_err)?;
            let mut slots = txn.open_table(SLOTS).map_err(db_err)?;

            if documents.get(original_id).map_err(db_err)?.is_some() {
                Some("id")
            } else if slots.get(vector_slot).map_err(db_err)?.is_some() {
                Some("slot")
            } else {
                documents
                    .insert(original_id, bytes.as_slice())
                    .map_err(db_err)?;
                slots.insert(vector_slot, original_id).map_err(db_err)?;
                None
            }
        };

        if let Some(what) = conflict {
            txn.abort().map_err(db_err)?;
            log::debug!("Rejected document {original_id} (slot {vector_slot}): duplicate {what}");
            return Ok(None);
        }

        Ok(Some(StagedInsert {
            txn,
            original_id: original_id.to_string(),
            vector_slot,
        }))
    }

    /// Look up the document that owns `vector_slot`.
    pub fn get_by_slot(&self, vector_slot: Slot) -> Result<Option<DocumentRecord>> {
        let txn = self.db.begin_read().map_err(db_err)?;
        let slots = txn.open_table(SLOTS).map_err(db_err)?;
        let Some(original_id) = slots.get(vector_slot).map_err(db_err)? else {
            return Ok(None);
        };

        let documents = txn.open_table(DOCUMENTS).map_err(db_err)?;
        let record = documents.get(original_id.value()).map_err(db_err)?;
        record.map(|bytes| decode(bytes.value())).transpose()
    }

    /// Look up a document by its id.
    pub fn get(&self, original_id: &str) -> Result<Option<DocumentRecord>> {
        let txn = self.db.begin_read().map_err(db_err)?;
        let documents = txn.open_table(DOCUMENTS).map_err(db_err)?;
        let record = documents.get(original_id).map_err(db_err)?;
        record.map(|bytes| decode(bytes.value())).transpose()
    }

    /// Whether a document with this id exists.
    pub fn contains(&self, original_id: &str) -> Result<bool> {
        let txn = self.db.begin_read().map_err(db_err)?;
        let documents = txn.open_table(DOCUMENTS).map_err(db_err)?;
        Ok(documents.get(original_id).map_err(db_err)?.is_some())
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize> {
        let txn = self.db.begin_read().map_err(db_err)?;
        let documents = txn.open_table(DOCUMENTS).map_err(db_err)?;
        Ok(documents.len().map_err(db_err)? as usize)
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Highest vector slot referenced by any document.
    pub fn max_slot(&self) -> Result<Option<Slot>> {
        let txn = self.db.begin_read().map_err(db_err)?;
        let slots = txn.open_table(SLOTS).map_err(db_err)?;
        let last = slots.last().map_err(db_err)?;
        Ok(last.map(|(slot, _)| slot.value()))
    }

    /// Remove every document whose slot is `first` or higher.
    ///
    /// Used to drop records whose vectors no longer exist, for example after
    /// the index file was lost. Returns the number of removed documents.
    pub fn remove_from_slot(&self, first: Slot) -> Result<usize> {
        let txn = self.db.begin_write().map_err(db_err)?;
        let removed = {
            let mut documents = txn.open_table(DOCUMENTS).map_err(db_err)?;
            let mut slots = txn.open_table(SLOTS).map_err(db_err)?;

            let mut doomed: Vec<(Slot, String)> = Vec::new();
            for entry in slots.range(first..).map_err(db_err)? {
                let (slot, original_id) = entry.map_err(db_err)?;
                doomed.push((slot.value(), original_id.value().to_string()));
            }

            for (slot, original_id) in &doomed {
                slots.remove(*slot).map_err(db_err)?;
                documents.remove(original_id.as_str()).map_err(db_err)?;
            }
            doomed.len()
        };
        txn.commit().map_err(db_err)?;
        Ok(removed)
    }

    /// Delete all documents. Idempotent.
    pub fn clear(&self) -> Result<()> {
        let txn = self.db.begin_write().map_err(db_err)?;
        txn.delete_table(DOCUMENTS).map_err(db_err)?;
        txn.delete_table(SLOTS).map_err(db_err)?;
        {
            txn.open_table(DOCUMENTS).map_err(db_err)?;
            txn.open_table(SLOTS).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;

        log::debug!("Cleared document store at {}", self.path.display());
        Ok(())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("path", &self.path)
            .finish()
    }
}

fn decode(bytes: &[u8]) -> Result<DocumentRecord> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::Serialization(format!("Corrupt document record: {e}")))
}

// ============================================================================
// Staged inserts
// ============================================================================

/// A document written inside an uncommitted transaction.
///
/// The store accepts no other writes while this is alive.
#[must_use = "a staged insert is discarded unless committed"]
pub struct StagedInsert {
    txn: WriteTransaction,
    original_id: String,
    vector_slot: Slot,
}

impl StagedInsert {
    /// Id of the staged document.
    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    /// Slot the staged document references.
    pub fn vector_slot(&self) -> Slot {
        self.vector_slot
    }

    /// Durably commit the document.
    pub fn commit(self) -> Result<()> {
        self.txn.commit().map_err(db_err)
    }

    /// Discard the document.
    pub fn abort(self) -> Result<()> {
        self.txn.abort().map_err(db_err)
    }
}

impl std::fmt::Debug for StagedInsert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedInsert")
            .field("original_id", &self.original_id)
            .field("vector_slot", &self.vector_slot)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};

    fn open_store() -> (TempDir, DocumentStore) {
        let dir = tempdir().unwrap();
        let store = DocumentStore::open(dir.path().join("documents.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_add_and_get_by_slot_round_trip() {
        let (_dir, store) = open_store();
        let metadata = json!({"a": 1, "b": [1, 2, 3]});

        assert!(store.add("doc", "hello", &metadata, 0).unwrap());

        let record = store.get_by_slot(0).unwrap().unwrap();
        assert_eq!(record.original_id, "doc");
        assert_eq!(record.content, "hello");
        assert_eq!(record.metadata, json!({"a": 1, "b": [1, 2, 3]}));
        assert_eq!(record.vector_slot, 0);
    }

    #[test]
    fn test_get_by_slot_missing() {
        let (_dir, store) = open_store();
        assert!(store.get_by_slot(42).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected_without_mutation() {
        let (_dir, store) = open_store();
        assert!(store.add("d1", "first", &json!({}), 0).unwrap());
        assert!(!store.add("d1", "second", &json!({}), 1).unwrap());

        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get_by_slot(1).unwrap().is_none());
        assert_eq!(store.get("d1").unwrap().unwrap().content, "first");
    }

    #[test]
    fn test_duplicate_slot_rejected_without_mutation() {
        let (_dir, store) = open_store();
        assert!(store.add("d1", "first", &json!({}), 0).unwrap());
        assert!(!store.add("d2", "second", &json!({}), 0).unwrap());

        assert_eq!(store.len().unwrap(), 1);
        assert!(!store.contains("d2").unwrap());
        assert_eq!(store.get_by_slot(0).unwrap().unwrap().original_id, "d1");
    }

    #[test]
    fn test_staged_insert_invisible_until_commit() {
        let (_dir, store) = open_store();
        let staged = store
            .begin_add("d1", "text", &json!({}), 0)
            .unwrap()
            .unwrap();
        assert_eq!(staged.original_id(), "d1");
        assert_eq!(staged.vector_slot(), 0);

        assert!(store.get_by_slot(0).unwrap().is_none());
        staged.commit().unwrap();
        assert!(store.get_by_slot(0).unwrap().is_some());
    }

    #[test]
    fn test_staged_insert_abort_and_drop() {
        let (_dir, store) = open_store();

        let staged = store.begin_add("d1", "text", &json!({}), 0).unwrap().unwrap();
        staged.abort().unwrap();
        assert!(store.is_empty().unwrap());

        let staged = store.begin_add("d1", "text", &json!({}), 0).unwrap().unwrap();
        drop(staged);
        assert!(store.is_empty().unwrap());

        // The id is still free afterwards.
        assert!(store.add("d1", "text", &json!({}), 0).unwrap());
    }

    #[test]
    fn test_clear_idempotent() {
        let (_dir, store) = open_store();
        store.add("d1", "one", &json!({}), 0).unwrap();
        store.add("d2", "two", &json!({}), 1).unwrap();

        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());

        // Ids and slots are free again.
        assert!(store.add("d1", "again", &json!({}), 0).unwrap());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kb").join("documents.redb");
        {
            let store = DocumentStore::open(&path).unwrap();
            store
                .add("deck_slide_1", "Intro", &json!({"slide_number": 1}), 0)
                .unwrap();
        }

        let store = DocumentStore::open(&path).unwrap();
        let record = store.get_by_slot(0).unwrap().unwrap();
        assert_eq!(record.original_id, "deck_slide_1");
        assert_eq!(record.metadata["slide_number"], 1);
    }

    #[test]
    fn test_max_slot_and_remove_from_slot() {
        let (_dir, store) = open_store();
        assert_eq!(store.max_slot().unwrap(), None);

        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            store.add(id, id, &json!({}), i as Slot).unwrap();
        }
        assert_eq!(store.max_slot().unwrap(), Some(3));

        assert_eq!(store.remove_from_slot(2).unwrap(), 2);
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.max_slot().unwrap(), Some(1));
        assert!(!store.contains("c").unwrap());
        assert!(store.contains("b").unwrap());

        assert_eq!(store.remove_from_slot(10).unwrap(), 0);
    }

    #[test]
    fn test_metadata_scalars_and_null() {
        let (_dir, store) = open_store();
        store.add("s", "x", &json!("just a string"), 0).unwrap();
        store.add("n", "y", &json!(null), 1).unwrap();

        assert_eq!(store.get("s").unwrap().unwrap().metadata, json!("just a string"));
        assert_eq!(store.get("n").unwrap().unwrap().metadata, json!(null));
    }
}
