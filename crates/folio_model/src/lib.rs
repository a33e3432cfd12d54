//! # Folio Model
//!
//! Data model for the Folio document core.
//!
//! This crate defines the typed shapes shared by the validator, the
//! persistent store and the repository:
//! - [`Document`], [`Page`] and [`MasterPage`] — the editable tree
//! - [`DrawableGraph`] and [`DrawableEntry`] — the per-page object graph
//! - [`Snapshot`] and [`DocumentSummary`] — recovery and listing records
//!
//! All types serialize to the canonical camelCase JSON wire form that the
//! store persists. Timestamps are `chrono::DateTime<Utc>` and serialize as
//! RFC 3339 text.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod defaults;
mod document;
mod graph;
mod page;
mod snapshot;

pub use document::{Document, DocumentSummary, GridSettings, Margins, PageSize, StyleBundle};
pub use graph::{DrawableEntry, DrawableGraph, Transform};
pub use page::{MasterPage, Page};
pub use snapshot::Snapshot;

/// Generates a fresh record identifier.
///
/// Used for documents, pages, master pages and repaired entries that are
/// missing an id.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
