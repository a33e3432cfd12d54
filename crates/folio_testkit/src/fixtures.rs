//! Fixtures and store helpers.
//!
//! Sample documents exercise every entry kind; the malformed fixtures
//! carry the defects the validator and codec are expected to repair.

use chrono::{DateTime, Utc};
use folio_model::{Document, DrawableEntry, DrawableGraph, MasterPage, Transform};
use folio_store::Store;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// A store with automatic cleanup of its backing directory.
pub struct TestStore {
    /// The store instance.
    pub store: Arc<Store>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(Store::open_in_memory().expect("Failed to open in-memory store")),
            _temp_dir: None,
        }
    }

    /// Creates a file-backed test store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open(temp_dir.path()).expect("Failed to open file store");
        Self {
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory for file-backed stores.
    pub fn path(&self) -> Option<&std::path::Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Arc<Store>) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary file-backed store and its directory.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Arc<Store>, &std::path::Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store
        .path()
        .expect("File store should have a path")
        .to_path_buf();
    f(&test_store.store, &path)
}

/// A fixed timestamp so fixture comparisons are deterministic.
pub fn fixed_time() -> DateTime<Utc> {
    "2024-05-01T10:00:00Z".parse().expect("valid timestamp")
}

/// A well-formed document with one page exercising every entry kind.
pub fn sample_document() -> Document {
    let mut doc = Document::new("Spring Brochure");
    doc.created = fixed_time();
    doc.last_modified = fixed_time();
    doc.pages[0].graph = Some(sample_graph());
    doc
}

/// A graph containing one entry of every kind, nested group included.
pub fn sample_graph() -> DrawableGraph {
    DrawableGraph {
        objects: vec![
            DrawableEntry::Text {
                x: 36.0,
                y: 48.0,
                text: "Spring Sale".to_string(),
                font_family: "Helvetica".to_string(),
                font_size: 32.0,
                fill: Some("#1a1a1a".to_string()),
                transform: Transform::default(),
            },
            DrawableEntry::Image {
                x: 36.0,
                y: 120.0,
                src: "assets/hero.png".to_string(),
                width: 540.0,
                height: 300.0,
                transform: Transform::default(),
            },
            DrawableEntry::Rect {
                x: 36.0,
                y: 440.0,
                width: 240.0,
                height: 120.0,
                fill: "#ffd700".to_string(),
                transform: Transform::default(),
            },
            DrawableEntry::Ellipse {
                x: 320.0,
                y: 440.0,
                width: 120.0,
                height: 120.0,
                fill: "#87ceeb".to_string(),
                transform: Transform::default(),
            },
            DrawableEntry::Group {
                x: 36.0,
                y: 600.0,
                objects: vec![DrawableEntry::Line {
                    x: 0.0,
                    y: 0.0,
                    x2: 540.0,
                    y2: 0.0,
                    stroke: "#000000".to_string(),
                    transform: Transform::default(),
                }],
                transform: Transform::default(),
            },
        ],
        ..DrawableGraph::default()
    }
}

/// A well-formed master page with a simple footer graph.
pub fn sample_master_page() -> MasterPage {
    let mut master = MasterPage::new("A-Master");
    master.created = fixed_time();
    master.last_modified = fixed_time();
    master.graph = Some(DrawableGraph {
        objects: vec![DrawableEntry::Line {
            x: 36.0,
            y: 756.0,
            x2: 576.0,
            y2: 756.0,
            stroke: "#888888".to_string(),
            transform: Transform::default(),
        }],
        ..DrawableGraph::default()
    });
    master
}

/// A document record with the classic defects: missing title and pages,
/// mistyped grid, inverted timestamps.
pub fn malformed_document_value() -> Value {
    json!({
        "id": "broken-1",
        "grid": "not an object",
        "created": "2024-06-01T00:00:00Z",
        "lastModified": "2024-05-01T00:00:00Z",
        "pages": "nope"
    })
}

/// A graph container with one entry of every repairable defect plus the
/// two unrepairable ones (untagged and sourceless-image, both dropped).
pub fn malformed_graph_value() -> Value {
    json!({
        "objects": [
            {"type": "text", "x": 1, "y": 2},
            {"type": "rect", "x": 0, "y": 0},
            {"type": "image", "x": 0, "y": 0, "width": 50, "height": 50},
            {"x": 9, "y": 9},
            {"type": "hologram", "x": 0, "y": 0}
        ]
    })
}

/// A page whose graph is stored under the legacy `canvasJSON` key as
/// serialized text.
pub fn legacy_page_value() -> Value {
    let graph = sample_graph();
    json!({
        "id": "legacy-page",
        "canvasJSON": graph.to_json_string(),
        "overrides": {},
        "guidesH": [],
        "guidesV": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_document_is_well_formed() {
        let doc = sample_document();
        assert!(!doc.id.is_empty());
        assert_eq!(doc.pages.len(), 1);
        let graph = doc.pages[0].graph.as_ref().unwrap();
        assert_eq!(graph.objects.len(), 5);
    }

    #[test]
    fn temp_store_is_usable() {
        with_temp_store(|store| {
            assert!(store.is_open());
        });
    }

    #[test]
    fn file_store_lives_in_temp_dir() {
        with_file_store(|store, path| {
            assert!(store.is_open());
            assert!(path.exists());
        });
    }
}
