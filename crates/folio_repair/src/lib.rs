//! # Folio Repair
//!
//! Structural validation and auto-repair for Folio documents and their
//! embedded drawable graphs.
//!
//! Two pure engines live here:
//! - [`validate_document`] — walks a raw document value top-down, reporting
//!   every missing or mistyped field and (optionally) building a repaired
//!   typed [`folio_model::Document`] with documented defaults.
//! - [`validate_graph`] — repairs the serialized drawable-object graph
//!   embedded in each page or master page.
//!
//! Neither engine performs I/O and neither ever returns an error: every
//! outcome, including "this entry could not be saved", is reported inside
//! the returned result. Both are idempotent — re-validating a repaired
//! output yields no diagnostics.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod graph;
mod validator;

pub use graph::{validate_graph, GraphInput, GraphValidation};
pub use validator::{
    validate_document, validate_document_typed, validate_master_page, DocumentValidation,
    MasterPageValidation,
};
