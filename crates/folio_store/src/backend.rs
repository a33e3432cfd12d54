//! Storage backend trait definition.

use crate::error::StoreResult;

/// A low-level named-blob store.
///
/// Backends are **opaque byte stores keyed by name**: one blob per
/// collection plus one for the schema manifest. The store owns all record
/// interpretation - backends do not understand collections, records or
/// indexes.
///
/// # Invariants
///
/// - `read` returns exactly the bytes most recently written under that name
/// - after `sync` returns, previously written blobs survive process
///   termination (for persistent backends)
/// - backends must be `Send + Sync` for shared use behind a lock
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - for tests and ephemeral stores
/// - [`super::FileBackend`] - one file per blob under a directory
pub trait StoreBackend: Send + Sync {
    /// Reads the blob stored under `name`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes (replacing) the blob stored under `name`.
    ///
    /// The write must be all-or-nothing per blob: a crash mid-write never
    /// leaves a partially updated blob visible to a later `read`.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write(&mut self, name: &str, data: &[u8]) -> StoreResult<()>;

    /// Removes the blob stored under `name`. Removing an absent blob is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn remove(&mut self, name: &str) -> StoreResult<()>;

    /// Lists the names of all stored blobs, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn list(&self) -> StoreResult<Vec<String>>;

    /// Ensures all completed writes are durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StoreResult<()>;
}
