//! Error types for the store layer.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur at the persistence boundary.
///
/// Not-found and verification failures are distinct variants so callers can
/// report them differently: a missing record is a caller-visible condition,
/// a failed readback is an I/O-class fault.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record encoding/decoding error.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Stored data could not be interpreted.
    #[error("corrupt store data: {message}")]
    Corrupt {
        /// Description of the corruption.
        message: String,
    },

    /// Requested record does not exist.
    #[error("record not found: '{id}' in collection '{collection}'")]
    NotFound {
        /// The collection searched.
        collection: String,
        /// The record id that was not found.
        id: String,
    },

    /// Named collection does not exist in the current schema.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// A write completed but the read-back did not confirm it.
    #[error("write verification failed: '{id}' in collection '{collection}'")]
    VerifyFailed {
        /// The collection written to.
        collection: String,
        /// The record id that did not read back.
        id: String,
    },

    /// The record is not storable (e.g. missing its id field).
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },

    /// Schema manifest problem.
    #[error("schema error: {message}")]
    Schema {
        /// Description of the problem.
        message: String,
    },

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates a corruption error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates an invalid-record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }
}
