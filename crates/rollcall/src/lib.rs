//! Rollcall: an in-memory person directory.
//!
//! This crate holds the data model and the concurrent store behind the
//! Rollcall gRPC service. The store is a first-write-wins map from a person's
//! name to their record; it owns all of its synchronization, so any number of
//! concurrent calls can share one [`Directory`] through an `Arc` without
//! locking around it.

mod record;
mod store;

pub use record::PersonRecord;
pub use store::Directory;
