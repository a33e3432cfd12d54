//! Pages and master pages.

use crate::graph::DrawableGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One page of a document.
///
/// The master-page link is a weak reference by id; the master page itself
/// lives in [`crate::Document::master_pages`] and in the store's
/// `master_pages` collection. `overrides` and the guide lists are always
/// present, even when empty — serde defaults guarantee that for decoded
/// records, and the validator guarantees it for repaired ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Unique page identifier.
    pub id: String,
    /// The drawable-object graph. `None` until the page is first drawn on.
    #[serde(default)]
    pub graph: Option<DrawableGraph>,
    /// Id of the applied master page, if any.
    #[serde(default)]
    pub master_page_id: Option<String>,
    /// Per-page overrides of master-page objects, keyed by the overridden
    /// object's id.
    #[serde(default)]
    pub overrides: BTreeMap<String, Value>,
    /// Horizontal guide positions.
    #[serde(default)]
    pub guides_h: Vec<f64>,
    /// Vertical guide positions.
    #[serde(default)]
    pub guides_v: Vec<f64>,
}

impl Page {
    /// Creates a new empty page with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: crate::new_id(),
            graph: None,
            master_page_id: None,
            overrides: BTreeMap::new(),
            guides_h: Vec::new(),
            guides_v: Vec::new(),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// A master page: a reusable drawable graph applied to pages by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterPage {
    /// Unique master-page identifier.
    pub id: String,
    /// Display name. Non-empty for a valid master page.
    pub name: String,
    /// The drawable-object graph shared with applied pages.
    #[serde(default)]
    pub graph: Option<DrawableGraph>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last-modification timestamp.
    pub last_modified: DateTime<Utc>,
    /// Owning document, for cross-document sharing and listing.
    #[serde(default)]
    pub document_id: Option<String>,
}

impl MasterPage {
    /// Creates a new empty master page with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            name: name.into(),
            graph: None,
            created: now,
            last_modified: now,
            document_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_has_empty_overrides_and_guides() {
        let page = Page::new();
        assert!(!page.id.is_empty());
        assert!(page.overrides.is_empty());
        assert!(page.guides_h.is_empty());
        assert!(page.guides_v.is_empty());
        assert!(page.graph.is_none());
    }

    #[test]
    fn page_decodes_with_missing_optional_fields() {
        // A minimal record from an older writer: only the id is present.
        let page: Page = serde_json::from_str(r#"{"id":"p1"}"#).unwrap();
        assert_eq!(page.id, "p1");
        assert!(page.overrides.is_empty());
        assert!(page.guides_h.is_empty());
        assert!(page.master_page_id.is_none());
    }

    #[test]
    fn master_page_roundtrips() {
        let mp = MasterPage::new("A-Master");
        let text = serde_json::to_string(&mp).unwrap();
        let back: MasterPage = serde_json::from_str(&text).unwrap();
        assert_eq!(back, mp);
    }
}
