//! In-memory storage backend for testing and ephemeral stores.

use crate::backend::StoreBackend;
use crate::error::StoreResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory named-blob backend.
///
/// Suitable for unit tests, integration tests and ephemeral stores that do
/// not need persistence. Thread-safe behind an internal lock.
///
/// # Example
///
/// ```rust
/// use folio_store::{InMemoryBackend, StoreBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.write("documents", b"{}").unwrap();
/// assert_eq!(backend.read("documents").unwrap(), Some(b"{}".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with blobs.
    ///
    /// Useful for testing schema-upgrade and recovery scenarios.
    #[must_use]
    pub fn with_blobs(blobs: HashMap<String, Vec<u8>>) -> Self {
        Self {
            blobs: RwLock::new(blobs),
        }
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn blob_count(&self) -> usize {
        self.blobs.read().len()
    }
}

impl StoreBackend for InMemoryBackend {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(name).cloned())
    }

    fn write(&mut self, name: &str, data: &[u8]) -> StoreResult<()> {
        self.blobs.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> StoreResult<()> {
        self.blobs.write().remove(name);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self.blobs.read().keys().cloned().collect())
    }

    fn sync(&mut self) -> StoreResult<()> {
        // Nothing pending for an in-memory backend.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_absent_blob_returns_none() {
        let backend = InMemoryBackend::new();
        assert!(backend.read("missing").unwrap().is_none());
    }

    #[test]
    fn write_then_read_roundtrips() {
        let mut backend = InMemoryBackend::new();
        backend.write("a", b"hello").unwrap();
        assert_eq!(backend.read("a").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn write_replaces_previous_blob() {
        let mut backend = InMemoryBackend::new();
        backend.write("a", b"one").unwrap();
        backend.write("a", b"two").unwrap();
        assert_eq!(backend.read("a").unwrap(), Some(b"two".to_vec()));
        assert_eq!(backend.blob_count(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut backend = InMemoryBackend::new();
        backend.write("a", b"data").unwrap();
        backend.remove("a").unwrap();
        backend.remove("a").unwrap();
        assert!(backend.read("a").unwrap().is_none());
    }

    #[test]
    fn list_returns_all_names() {
        let mut backend = InMemoryBackend::new();
        backend.write("a", b"1").unwrap();
        backend.write("b", b"2").unwrap();
        let mut names = backend.list().unwrap();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }
}
