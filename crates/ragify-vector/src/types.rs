//! Result types for vector search.

use ragify_core::Slot;
use serde::{Deserialize, Serialize};

/// One entry of a nearest-neighbor result.
///
/// A neighbor without a slot is a *sentinel*: the index was empty and had
/// nothing to return for this position. Callers must skip sentinels rather
/// than treat them as matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Matching slot, or `None` for a sentinel.
    pub slot: Option<Slot>,

    /// Squared L2 distance between the normalized query and the stored vector.
    pub distance: f32,
}

impl Neighbor {
    /// A real match.
    pub fn new(slot: Slot, distance: f32) -> Self {
        Self {
            slot: Some(slot),
            distance,
        }
    }

    /// The "no match" placeholder returned by searches over an empty index.
    pub fn sentinel() -> Self {
        Self {
            slot: None,
            distance: f32::INFINITY,
        }
    }

    /// Whether this neighbor refers to a stored vector.
    pub fn is_match(&self) -> bool {
        self.slot.is_some()
    }
}
