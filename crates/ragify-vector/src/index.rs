//! Exact flat vector index.
//!
//! `FlatIndex` keeps every vector in one row-major buffer and answers
//! k-nearest-neighbor queries by scanning all of them. There is no
//! approximation and no pruning: at the corpus sizes this crate targets a
//! full scan is fast and always exact.
//!
//! # Slots
//!
//! Each added vector gets the next slot, equal to its insertion position
//! since the last clear. Vectors are never removed individually.
//!
//! # Persistence
//!
//! A file-backed index rewrites its snapshot (see [`crate::persistence`])
//! before `add` or `clear` return. Opening tolerates a missing, corrupt, or
//! incompatible file by starting empty and logging a warning.

use std::path::{Path, PathBuf};

use ragify_core::{Error, Result, Slot, ensure_parent_dir};

use crate::distance::{normalize, normalized, squared_l2};
use crate::persistence::{IndexSnapshot, load_snapshot, save_snapshot};
use crate::types::Neighbor;

/// Brute-force nearest-neighbor index over unit-normalized vectors.
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
    path: Option<PathBuf>,
}

impl FlatIndex {
    /// Create an empty index that lives only in memory.
    pub fn in_memory(dimension: usize) -> Result<Self> {
        check_dimension(dimension)?;
        Ok(Self {
            dimension,
            vectors: Vec::new(),
            path: None,
        })
    }

    /// Open a file-backed index, loading any existing snapshot at `path`.
    ///
    /// A missing file yields an empty index. A snapshot that fails to decode
    /// or validate is ignored with a warning and the index starts empty; it
    /// is overwritten on the next write.
    ///
    /// Fails on an invalid `dimension`, on a snapshot built with a different
    /// dimension (the file is left untouched), and on I/O errors reading an
    /// existing file.
    pub fn open(path: impl Into<PathBuf>, dimension: usize) -> Result<Self> {
        check_dimension(dimension)?;
        let path = path.into();

        let vectors = match load_snapshot(&path) {
            Ok(Some(snapshot)) if snapshot.dimension as usize == dimension => {
                log::debug!(
                    "Loaded {} vectors from {}",
                    snapshot.count,
                    path.display()
                );
                snapshot.vectors
            }
            Ok(Some(snapshot)) => {
                log::error!(
                    "Index at {} has dimension {}, expected {dimension}",
                    path.display(),
                    snapshot.dimension
                );
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: snapshot.dimension as usize,
                });
            }
            Ok(None) => {
                log::debug!("No index at {}; starting empty", path.display());
                Vec::new()
            }
            Err(e @ Error::Parse(_)) => {
                log::warn!(
                    "Could not load index at {}: {e}; starting with an empty index",
                    path.display()
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            dimension,
            vectors,
            path: Some(path),
        })
    }

    /// Vector dimension fixed at construction.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The stored (normalized) vector at `slot`.
    pub fn vector(&self, slot: Slot) -> Option<&[f32]> {
        let slot = usize::try_from(slot).ok()?;
        if slot >= self.len() {
            return None;
        }
        let start = slot * self.dimension;
        Some(&self.vectors[start..start + self.dimension])
    }

    /// The slot the next `add` will assign.
    pub fn next_slot(&self) -> Slot {
        self.len() as Slot
    }

    /// Normalize and append a vector, returning its slot.
    ///
    /// The snapshot is persisted before returning. If persisting fails the
    /// in-memory append is rolled back and the error returned.
    pub fn add(&mut self, vector: &[f32]) -> Result<Slot> {
        self.check_input(vector)?;
        let mut vector = vector.to_vec();
        normalize(&mut vector)?;

        let slot = self.next_slot();
        let previous_len = self.vectors.len();
        self.vectors.extend_from_slice(&vector);

        if let Err(e) = self.persist() {
            self.vectors.truncate(previous_len);
            return Err(e);
        }

        log::debug!("Added vector at slot {slot}");
        Ok(slot)
    }

    /// The `k` nearest stored vectors to `query`, closest first.
    ///
    /// Distances are squared L2 between unit vectors. Equal distances keep
    /// slot order. An empty index answers with `k` sentinels; a `k` too large
    /// to allocate is an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_input(query)?;
        let query = normalized(query)?;

        if self.is_empty() {
            let mut sentinels = Vec::new();
            sentinels.try_reserve_exact(k).map_err(|e| {
                Error::invalid_data(format!("cannot return {k} sentinel neighbors: {e}"))
            })?;
            sentinels.resize(k, Neighbor::sentinel());
            return Ok(sentinels);
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(slot, stored)| Neighbor::new(slot as Slot, squared_l2(&query, stored)))
            .collect();

        // Stable sort: ties stay in slot order.
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }

    /// Drop every vector and persist the empty state. Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        self.vectors.clear();
        self.persist()?;
        log::debug!("Cleared vector index");
        Ok(())
    }

    fn check_input(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        ensure_parent_dir(path)?;
        let snapshot = IndexSnapshot::new(self.dimension, &self.vectors)?;
        save_snapshot(path, &snapshot)
    }
}

fn check_dimension(dimension: usize) -> Result<()> {
    if dimension == 0 {
        return Err(Error::config("vector dimension must be positive"));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
