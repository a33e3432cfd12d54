//! Document root and its metadata substructures.

use crate::defaults;
use crate::page::{MasterPage, Page};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A publication document: ordered pages, shared master pages and a style
/// bundle, plus page-geometry and grid metadata.
///
/// # Invariants
///
/// - `id` is non-empty
/// - `pages` contains at least one page
/// - `created <= last_modified`
///
/// Construction through [`Document::new`] upholds all three; values decoded
/// from untrusted JSON are routed through the validator, which repairs any
/// violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Author/creator name.
    pub creator: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last-modification timestamp.
    pub last_modified: DateTime<Utc>,
    /// Physical page geometry.
    pub page_size: PageSize,
    /// Page margins.
    pub margins: Margins,
    /// Grid and ruler configuration.
    pub grid: GridSettings,
    /// Ordered pages. Never empty for a valid document.
    pub pages: Vec<Page>,
    /// Master pages embedded in this document.
    #[serde(default)]
    pub master_pages: Vec<MasterPage>,
    /// Named style definitions.
    #[serde(default)]
    pub styles: StyleBundle,
}

impl Document {
    /// Creates a new document with one empty page and default metadata.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            title: title.into(),
            creator: defaults::DEFAULT_CREATOR.to_string(),
            created: now,
            last_modified: now,
            page_size: PageSize::default(),
            margins: Margins::default(),
            grid: GridSettings::default(),
            pages: vec![Page::new()],
            master_pages: Vec::new(),
            styles: StyleBundle::default(),
        }
    }

    /// Returns a summary record for document listings.
    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created: self.created,
            last_modified: self.last_modified,
            page_count: self.pages.len(),
        }
    }
}

/// Physical page dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    /// Page width.
    pub width: f64,
    /// Page height.
    pub height: f64,
    /// Measurement unit tag (e.g. `"pt"`).
    pub unit: String,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: defaults::DEFAULT_PAGE_WIDTH,
            height: defaults::DEFAULT_PAGE_HEIGHT,
            unit: defaults::DEFAULT_PAGE_UNIT.to_string(),
        }
    }
}

/// Page margins, in page units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Margins {
    /// Top margin.
    pub top: f64,
    /// Right margin.
    pub right: f64,
    /// Bottom margin.
    pub bottom: f64,
    /// Left margin.
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: defaults::DEFAULT_MARGIN,
            right: defaults::DEFAULT_MARGIN,
            bottom: defaults::DEFAULT_MARGIN,
            left: defaults::DEFAULT_MARGIN,
        }
    }
}

/// Grid and ruler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    /// Whether the layout grid is drawn.
    pub show_grid: bool,
    /// Grid cell size in page units.
    pub grid_size: f64,
    /// Whether objects snap to the grid.
    pub snap_to_grid: bool,
    /// Whether rulers are drawn.
    pub show_rulers: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            show_grid: false,
            grid_size: defaults::DEFAULT_GRID_SIZE,
            snap_to_grid: false,
            show_rulers: true,
        }
    }
}

/// Named style definitions carried by a document.
///
/// Style payloads are opaque to the core; they are kept as JSON maps so the
/// editing surface owns their shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleBundle {
    /// Paragraph styles by name.
    #[serde(default)]
    pub paragraph: Map<String, Value>,
    /// Character styles by name.
    #[serde(default)]
    pub character: Map<String, Value>,
    /// Color swatches by name.
    #[serde(default)]
    pub colors: Map<String, Value>,
}

/// Listing record for a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Document identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last-modification timestamp.
    pub last_modified: DateTime<Utc>,
    /// Number of pages in the document.
    pub page_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_upholds_invariants() {
        let doc = Document::new("Brochure");
        assert!(!doc.id.is_empty());
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.created <= doc.last_modified);
    }

    #[test]
    fn serializes_camel_case() {
        let doc = Document::new("Brochure");
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("lastModified").is_some());
        assert!(value.get("masterPages").is_some());
        assert!(value.get("pageSize").is_some());
    }

    #[test]
    fn timestamps_serialize_as_rfc3339_text() {
        let doc = Document::new("Brochure");
        let value = serde_json::to_value(&doc).unwrap();
        let created = value.get("created").and_then(Value::as_str).unwrap();
        assert!(created.parse::<DateTime<Utc>>().is_ok());
    }

    #[test]
    fn summary_reflects_page_count() {
        let mut doc = Document::new("Brochure");
        doc.pages.push(Page::new());
        let summary = doc.summary();
        assert_eq!(summary.page_count, 2);
        assert_eq!(summary.id, doc.id);
    }

    #[test]
    fn roundtrips_through_json() {
        let doc = Document::new("Brochure");
        let text = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }
}
