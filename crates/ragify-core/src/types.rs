//! Shared primitive types.

/// Position of a vector in the index.
///
/// Slots are dense, zero-based, and assigned in insertion order since the
/// last clear. They are never reused until the index is cleared.
pub type Slot = u64;
