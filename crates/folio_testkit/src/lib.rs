//! # Folio Testkit
//!
//! Test utilities for the Folio document core.
//!
//! This crate provides:
//! - Fixtures: sample documents, master pages and deliberately damaged
//!   record values
//! - Store helpers with automatic cleanup
//! - Property-based generators for documents and drawable graphs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|store| {
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
