//! Rollcall gRPC service
//!
//! Exposes a shared [`rollcall::Directory`] over gRPC with one RPC per call
//! shape, plus a [`CallDriver`] that issues those calls from the client side
//! with a fixed per-call deadline.
//!
//! # Call shapes
//!
//! ```text
//! Client                                          Server
//! │  AddPerson(Person)                              │  unary
//! │ ──────────────────────────────────────────────> │
//! │ <────────────────────────────────────────────── │  AddResult
//! │                                                 │
//! │  AddPersons(Person, Person, ..., end)           │  client stream
//! │ ──────────────────────────────────────────────> │
//! │ <────────────────────────────────────────────── │  AddResult
//! │                                                 │
//! │  ListPersons(limit)                             │  server stream
//! │ ──────────────────────────────────────────────> │
//! │ <────────────────────────────────────────────── │  Person, Person, ..., end
//! │                                                 │
//! │  LookupPersons(name, name, ..., end)            │  bidirectional
//! │ <─────────────────────────────────────────────> │  Person for each known name
//! ```
//!
//! Every accepted call runs on its own task. The directory is the only state
//! shared between them and it does its own locking.

pub mod proto {
    #![allow(missing_docs)]
    #![allow(clippy::doc_markdown)]
    tonic::include_proto!("rollcall.v1");
}

mod convert;
mod driver;
mod server;

pub use driver::{CallDriver, CallError, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, DriverConfig};
pub use server::DirectoryService;

// Re-export proto types for convenience
pub use proto::{
    AddResult, ListRequest, LookupRequest, Person, directory_client::DirectoryClient,
    directory_server::DirectoryServer as DirectoryGrpcServer,
};
