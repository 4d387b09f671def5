//! Document storage for Ragify.
//!
//! A [`DocumentStore`] maps each document's original id to its content,
//! metadata, and the slot of its vector in the index. Ids and slots are both
//! unique. Records are durable once an add returns.

pub mod document;
pub mod store;

pub use document::{DocumentRecord, Metadata};
pub use store::{DocumentStore, StagedInsert};
