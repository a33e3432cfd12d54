//! Crash-recovery snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A point-in-time capture of one page's live state.
///
/// The payload is opaque to the core: the recovery manager stores whatever
/// the caller's snapshot function produced and hands it back unchanged to
/// the recovery callback. Distinct from undo history, which never touches
/// the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The page this snapshot belongs to.
    pub page_id: String,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Caller-defined payload.
    pub payload: Value,
}

impl Snapshot {
    /// Creates a snapshot record.
    #[must_use]
    pub fn new(page_id: impl Into<String>, timestamp: DateTime<Utc>, payload: Value) -> Self {
        Self {
            page_id: page_id.into(),
            timestamp,
            payload,
        }
    }

    /// The store record id for this snapshot: page id plus capture time,
    /// unique per (page, instant).
    #[must_use]
    pub fn record_id(&self) -> String {
        format!("{}:{}", self.page_id, self.timestamp.timestamp_millis())
    }
}
