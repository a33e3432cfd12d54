//! # Folio Store
//!
//! Persistent record-collection store for the Folio document core.
//!
//! The store keeps named collections of JSON records on top of a pluggable
//! [`StoreBackend`] (in-memory or file-based). It provides:
//! - schema-versioned, additive collection initialization
//! - CRUD with put-then-verify-by-readback (silent write loss is detected)
//! - secondary index ordering for listings
//!
//! Atomicity covers one record write at a time; there is no cross-collection
//! transaction. Callers that need consistency across related writes rely on
//! the repository's self-healing load path.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
pub mod schema;
mod store;

pub use backend::StoreBackend;
pub use error::{StoreError, StoreResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use store::{CollectionStats, Store, StoreStats};
