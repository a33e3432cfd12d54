//! # Folio Core
//!
//! The consistency and recovery layer of the Folio document engine:
//!
//! - [`DocumentRepository`] — validated load/save of documents and master
//!   pages over the [`folio_store::Store`], with structural repair on both
//!   paths.
//! - [`RecoveryManager`] — periodic crash-recovery snapshots of open
//!   pages, with bounded in-memory and store-side retention.
//! - [`HistoryManager`] — session-local undo/redo over full-state
//!   snapshots, never persisted.
//!
//! The three are independent: an application can use the repository
//! without snapshots, or the history manager on its own.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod history;
mod recovery;
mod repository;

pub use error::{CoreError, CoreResult};
pub use history::{ChangeFn, HistoryManager, HistoryState, HistoryStatus, RestoreFn};
pub use recovery::{
    Clock, ManualClock, RecoveryConfig, RecoveryManager, SnapshotFn, SystemClock,
};
pub use repository::DocumentRepository;
