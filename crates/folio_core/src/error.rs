//! Error types for the Folio core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can escape the core's public operations.
///
/// Structural and graph-content defects never appear here — they are
/// repaired (or reported inside validation results) by design. What
/// remains is the store boundary, encoding, and snapshot-capture
/// callbacks.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Persistence-boundary failure, including not-found and failed
    /// write verification.
    #[error("store error: {0}")]
    Store(#[from] folio_store::StoreError),

    /// Record encoding/decoding failure.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A snapshot-producer callback failed.
    #[error("snapshot capture failed for page '{page_id}': {message}")]
    SnapshotCapture {
        /// The page being captured.
        page_id: String,
        /// Description of the failure.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a snapshot-capture error.
    pub fn snapshot_capture(page_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SnapshotCapture {
            page_id: page_id.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// True when this error is the distinct not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(folio_store::StoreError::NotFound { .. }))
    }
}
