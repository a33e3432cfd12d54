//! Property-based generators using proptest.
//!
//! The typed strategies only produce values that satisfy the model
//! invariants, so anything they generate must validate cleanly and
//! round-trip through the store.

use chrono::{DateTime, Utc};
use folio_model::{Document, DrawableEntry, DrawableGraph, MasterPage, Page, Transform};
use proptest::prelude::*;

/// Strategy for finite on-page coordinates.
pub fn coordinate_strategy() -> impl Strategy<Value = f64> {
    -1000.0..1000.0f64
}

/// Strategy for positive dimensions.
pub fn dimension_strategy() -> impl Strategy<Value = f64> {
    0.5..1000.0f64
}

/// Strategy for short display strings (titles, names, text runs).
pub fn label_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9 ]{0,23}").expect("Invalid regex")
}

/// Strategy for color values in hex form.
pub fn color_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("#[0-9a-f]{6}").expect("Invalid regex")
}

/// Strategy for a pair of ordered timestamps (`created <= last_modified`).
pub fn timestamp_pair_strategy() -> impl Strategy<Value = (DateTime<Utc>, DateTime<Utc>)> {
    (0i64..4_000_000_000_000, 0i64..86_400_000).prop_map(|(base, delta)| {
        let created = DateTime::from_timestamp_millis(base).unwrap_or_default();
        let modified = DateTime::from_timestamp_millis(base + delta).unwrap_or_default();
        (created, modified)
    })
}

fn transform_strategy() -> impl Strategy<Value = Transform> {
    (-360.0..360.0f64, 0.1..4.0f64, 0.0..1.0f64).prop_map(|(rotation, scale, opacity)| {
        Transform {
            rotation,
            scale,
            opacity,
        }
    })
}

fn leaf_entry_strategy() -> impl Strategy<Value = DrawableEntry> {
    prop_oneof![
        (
            coordinate_strategy(),
            coordinate_strategy(),
            label_strategy(),
            4.0..96.0f64,
            proptest::option::of(color_strategy()),
            transform_strategy(),
        )
            .prop_map(|(x, y, text, font_size, fill, transform)| {
                DrawableEntry::Text {
                    x,
                    y,
                    text,
                    font_family: "Helvetica".to_string(),
                    font_size,
                    fill,
                    transform,
                }
            }),
        (
            coordinate_strategy(),
            coordinate_strategy(),
            dimension_strategy(),
            dimension_strategy(),
            transform_strategy(),
        )
            .prop_map(|(x, y, width, height, transform)| DrawableEntry::Image {
                x,
                y,
                src: "assets/fixture.png".to_string(),
                width,
                height,
                transform,
            }),
        (
            coordinate_strategy(),
            coordinate_strategy(),
            dimension_strategy(),
            dimension_strategy(),
            color_strategy(),
            transform_strategy(),
        )
            .prop_map(|(x, y, width, height, fill, transform)| DrawableEntry::Rect {
                x,
                y,
                width,
                height,
                fill,
                transform,
            }),
        (
            coordinate_strategy(),
            coordinate_strategy(),
            dimension_strategy(),
            dimension_strategy(),
            color_strategy(),
            transform_strategy(),
        )
            .prop_map(|(x, y, width, height, fill, transform)| DrawableEntry::Ellipse {
                x,
                y,
                width,
                height,
                fill,
                transform,
            }),
        (
            coordinate_strategy(),
            coordinate_strategy(),
            coordinate_strategy(),
            coordinate_strategy(),
            color_strategy(),
            transform_strategy(),
        )
            .prop_map(|(x, y, x2, y2, stroke, transform)| DrawableEntry::Line {
                x,
                y,
                x2,
                y2,
                stroke,
                transform,
            }),
    ]
}

/// Strategy for drawable entries, including nested groups.
pub fn entry_strategy() -> impl Strategy<Value = DrawableEntry> {
    leaf_entry_strategy().prop_recursive(2, 12, 4, |inner| {
        (
            coordinate_strategy(),
            coordinate_strategy(),
            prop::collection::vec(inner, 0..4),
            transform_strategy(),
        )
            .prop_map(|(x, y, objects, transform)| DrawableEntry::Group {
                x,
                y,
                objects,
                transform,
            })
    })
}

/// Strategy for well-formed drawable graphs.
pub fn graph_strategy() -> impl Strategy<Value = DrawableGraph> {
    prop::collection::vec(entry_strategy(), 0..6).prop_map(|objects| DrawableGraph {
        objects,
        ..DrawableGraph::default()
    })
}

/// Strategy for well-formed pages, some never drawn on.
pub fn page_strategy() -> impl Strategy<Value = Page> {
    proptest::option::of(graph_strategy()).prop_map(|graph| {
        let mut page = Page::new();
        page.graph = graph;
        page
    })
}

/// Strategy for well-formed master pages.
pub fn master_page_strategy() -> impl Strategy<Value = MasterPage> {
    (
        label_strategy(),
        proptest::option::of(graph_strategy()),
        timestamp_pair_strategy(),
    )
        .prop_map(|(name, graph, (created, last_modified))| {
            let mut master = MasterPage::new(name);
            master.graph = graph;
            master.created = created;
            master.last_modified = last_modified;
            master
        })
}

/// Strategy for well-formed documents.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    (
        label_strategy(),
        label_strategy(),
        prop::collection::vec(page_strategy(), 1..4),
        prop::collection::vec(master_page_strategy(), 0..3),
        timestamp_pair_strategy(),
    )
        .prop_map(
            |(title, creator, pages, master_pages, (created, last_modified))| {
                let mut doc = Document::new(title);
                doc.creator = creator;
                doc.pages = pages;
                doc.master_pages = master_pages;
                doc.created = created;
                doc.last_modified = last_modified;
                doc
            },
        )
}

/// Configuration presets for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
