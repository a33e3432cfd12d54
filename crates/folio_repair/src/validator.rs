//! Structural validator and auto-repair for the document tree.

use crate::graph::{validate_graph, GraphInput};
use chrono::{DateTime, Utc};
use folio_model::defaults;
use folio_model::{
    Document, DrawableGraph, GridSettings, Margins, MasterPage, Page, PageSize, StyleBundle,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Outcome of one validator pass over a document value.
#[derive(Debug, Clone)]
pub struct DocumentValidation {
    /// True when no violations were found.
    pub valid: bool,
    /// One human-readable diagnostic per violation, in walk order.
    pub errors: Vec<String>,
    /// One entry per repair action taken. Empty unless auto-repair was
    /// requested.
    pub warnings: Vec<String>,
    /// The repaired typed document. Present when auto-repair was requested.
    pub repaired: Option<Document>,
}

/// Validates a raw document value against the required-field and type
/// invariants of the document tree.
///
/// Walks top-down: document fields, then every page, then every master
/// page. Each violation appends a diagnostic to `errors`; with
/// `auto_repair`, the documented default is substituted and a matching
/// entry appended to `warnings`. Never panics and never fails — the result
/// always describes what was found.
///
/// Idempotent: re-validating the serialization of a repaired document
/// yields `valid: true` with no errors.
#[must_use]
pub fn validate_document(value: &Value, auto_repair: bool) -> DocumentValidation {
    let mut walk = Walk::new(auto_repair);
    let repaired = walk.document(value);

    if auto_repair && !walk.warnings.is_empty() {
        tracing::debug!(repairs = walk.warnings.len(), "repaired document structure");
    }

    DocumentValidation {
        valid: walk.errors.is_empty(),
        errors: walk.errors,
        warnings: walk.warnings,
        repaired: auto_repair.then_some(repaired),
    }
}

/// Validates an already-typed document.
///
/// Typed construction rules out missing fields, but semantic defects — an
/// empty id, inverted timestamps, a document with zero pages — are still
/// possible and are caught (and repaired) here by validating the
/// serialized form.
#[must_use]
pub fn validate_document_typed(doc: &Document, auto_repair: bool) -> DocumentValidation {
    match serde_json::to_value(doc) {
        Ok(value) => validate_document(&value, auto_repair),
        // Unreachable for the model types; reported rather than panicking.
        Err(err) => validate_document(&Value::String(err.to_string()), auto_repair),
    }
}

/// Outcome of one validator pass over a master-page value.
#[derive(Debug, Clone)]
pub struct MasterPageValidation {
    /// True when no violations were found.
    pub valid: bool,
    /// One diagnostic per violation.
    pub errors: Vec<String>,
    /// One entry per repair action taken.
    pub warnings: Vec<String>,
    /// The repaired typed master page. Present when auto-repair was
    /// requested.
    pub repaired: Option<MasterPage>,
}

/// Validates a standalone master-page record, as stored in the
/// master-pages collection.
///
/// Same contract as [`validate_document`]: total, never panics,
/// idempotent.
#[must_use]
pub fn validate_master_page(value: &Value, auto_repair: bool) -> MasterPageValidation {
    let mut walk = Walk::new(auto_repair);
    let repaired = walk.master_page(value, "masterPage");
    MasterPageValidation {
        valid: walk.errors.is_empty(),
        errors: walk.errors,
        warnings: walk.warnings,
        repaired: auto_repair.then_some(repaired),
    }
}

struct Walk {
    repair: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Walk {
    fn new(repair: bool) -> Self {
        Self {
            repair,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn violation(&mut self, error: impl Into<String>, repair_note: impl Into<String>) {
        self.errors.push(error.into());
        if self.repair {
            self.warnings.push(repair_note.into());
        }
    }

    fn document(&mut self, value: &Value) -> Document {
        let Some(obj) = value.as_object() else {
            self.violation(
                "document: not an object",
                "document: replaced with a default document",
            );
            return Document::new(defaults::DEFAULT_TITLE);
        };

        let id = self.identity(obj, "document", "id");
        let title = self.string_or(obj, "document", "title", defaults::DEFAULT_TITLE);
        let creator = self.string_or(obj, "document", "creator", defaults::DEFAULT_CREATOR);
        let (created, last_modified) = self.timestamps(obj, "document");
        let page_size = self.page_size(obj);
        let margins = self.margins(obj);
        let grid = self.grid(obj);
        let pages = self.pages(obj);
        let master_pages = self.master_pages(obj);
        let styles = self.styles(obj);

        Document {
            id,
            title,
            creator,
            created,
            last_modified,
            page_size,
            margins,
            grid,
            pages,
            master_pages,
            styles,
        }
    }

    // ------------------------------------------------------------------
    // Document substructures
    // ------------------------------------------------------------------

    fn page_size(&mut self, obj: &Map<String, Value>) -> PageSize {
        let default = PageSize::default();
        let Some(inner) = obj.get("pageSize").and_then(Value::as_object) else {
            self.violation(
                "document: missing required field 'pageSize'",
                "document: applied default page size",
            );
            return default;
        };
        PageSize {
            width: self.positive_or(inner, "pageSize", "width", default.width),
            height: self.positive_or(inner, "pageSize", "height", default.height),
            unit: self.string_or(inner, "pageSize", "unit", &default.unit),
        }
    }

    fn margins(&mut self, obj: &Map<String, Value>) -> Margins {
        let default = Margins::default();
        let Some(inner) = obj.get("margins").and_then(Value::as_object) else {
            self.violation(
                "document: missing required field 'margins'",
                "document: applied default margins",
            );
            return default;
        };
        Margins {
            top: self.number_or(inner, "margins", "top", default.top),
            right: self.number_or(inner, "margins", "right", default.right),
            bottom: self.number_or(inner, "margins", "bottom", default.bottom),
            left: self.number_or(inner, "margins", "left", default.left),
        }
    }

    fn grid(&mut self, obj: &Map<String, Value>) -> GridSettings {
        let default = GridSettings::default();
        let Some(inner) = obj.get("grid").and_then(Value::as_object) else {
            self.violation(
                "document: missing required field 'grid'",
                "document: applied default grid settings",
            );
            return default;
        };
        GridSettings {
            show_grid: self.bool_or(inner, "grid", "showGrid", default.show_grid),
            grid_size: self.positive_or(inner, "grid", "gridSize", default.grid_size),
            snap_to_grid: self.bool_or(inner, "grid", "snapToGrid", default.snap_to_grid),
            show_rulers: self.bool_or(inner, "grid", "showRulers", default.show_rulers),
        }
    }

    fn pages(&mut self, obj: &Map<String, Value>) -> Vec<Page> {
        match obj.get("pages") {
            Some(Value::Array(raw)) if !raw.is_empty() => raw
                .iter()
                .enumerate()
                .map(|(i, page)| self.page(page, &format!("pages[{i}]")))
                .collect(),
            Some(Value::Array(_)) => {
                self.violation(
                    "document: 'pages' is empty; a document needs at least one page",
                    "document: inserted a default page",
                );
                vec![Page::new()]
            }
            Some(other) => {
                self.violation(
                    format!("document: 'pages' is {}, not an array", type_name(other)),
                    "document: inserted a default page",
                );
                vec![Page::new()]
            }
            None => {
                self.violation(
                    "document: missing required field 'pages'",
                    "document: inserted a default page",
                );
                vec![Page::new()]
            }
        }
    }

    fn master_pages(&mut self, obj: &Map<String, Value>) -> Vec<MasterPage> {
        match obj.get("masterPages") {
            Some(Value::Array(raw)) => raw
                .iter()
                .enumerate()
                .map(|(i, mp)| self.master_page(mp, &format!("masterPages[{i}]")))
                .collect(),
            Some(other) => {
                self.violation(
                    format!(
                        "document: 'masterPages' is {}, not an array",
                        type_name(other)
                    ),
                    "document: reset masterPages to empty",
                );
                Vec::new()
            }
            None => {
                self.violation(
                    "document: missing required field 'masterPages'",
                    "document: reset masterPages to empty",
                );
                Vec::new()
            }
        }
    }

    fn styles(&mut self, obj: &Map<String, Value>) -> StyleBundle {
        let Some(inner) = obj.get("styles").and_then(Value::as_object) else {
            self.violation(
                "document: missing required field 'styles'",
                "document: applied empty style bundle",
            );
            return StyleBundle::default();
        };
        StyleBundle {
            paragraph: self.style_map(inner, "paragraph"),
            character: self.style_map(inner, "character"),
            colors: self.style_map(inner, "colors"),
        }
    }

    fn style_map(&mut self, obj: &Map<String, Value>, key: &str) -> Map<String, Value> {
        match obj.get(key) {
            // Absent sub-bundles are tolerated; the canonical form always
            // writes them back.
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                self.violation(
                    format!("styles: '{key}' is {}, not an object", type_name(other)),
                    format!("styles: reset '{key}' to empty"),
                );
                Map::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // Pages and master pages
    // ------------------------------------------------------------------

    fn page(&mut self, value: &Value, path: &str) -> Page {
        let Some(obj) = value.as_object() else {
            self.violation(
                format!("{path}: not an object"),
                format!("{path}: replaced with a default page"),
            );
            return Page::new();
        };

        let id = self.identity(obj, path, "id");
        let graph = self.graph_field(obj, path);
        let master_page_id = self.optional_string(obj, path, "masterPageId");

        let overrides = match obj.get("overrides") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
            Some(Value::Null) | None => {
                self.violation(
                    format!("{path}: missing required field 'overrides'"),
                    format!("{path}: inserted empty overrides"),
                );
                BTreeMap::new()
            }
            Some(other) => {
                self.violation(
                    format!(
                        "{path}: 'overrides' is {}, not an object",
                        type_name(other)
                    ),
                    format!("{path}: inserted empty overrides"),
                );
                BTreeMap::new()
            }
        };

        let guides_h = self.guides(obj, path, "guidesH");
        let guides_v = self.guides(obj, path, "guidesV");

        Page {
            id,
            graph,
            master_page_id,
            overrides,
            guides_h,
            guides_v,
        }
    }

    fn master_page(&mut self, value: &Value, path: &str) -> MasterPage {
        let Some(obj) = value.as_object() else {
            self.violation(
                format!("{path}: not an object"),
                format!("{path}: replaced with a default master page"),
            );
            return MasterPage::new(defaults::DEFAULT_MASTER_NAME);
        };

        let id = self.identity(obj, path, "id");
        let name = match obj.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                self.violation(
                    format!("{path}: missing or empty 'name'"),
                    format!("{path}: named '{}'", defaults::DEFAULT_MASTER_NAME),
                );
                defaults::DEFAULT_MASTER_NAME.to_string()
            }
        };
        let graph = self.graph_field(obj, path);
        let (created, last_modified) = self.timestamps(obj, path);
        let document_id = self.optional_string(obj, path, "documentId");

        MasterPage {
            id,
            name,
            graph,
            created,
            last_modified,
            document_id,
        }
    }

    fn graph_field(&mut self, obj: &Map<String, Value>, path: &str) -> Option<DrawableGraph> {
        // Older writers stored the graph under 'canvasJSON'.
        let raw = obj
            .get("graph")
            .or_else(|| obj.get("canvasJSON"))
            .filter(|v| !v.is_null())?;

        let result = validate_graph(GraphInput::Value(raw), self.repair);
        for error in &result.errors {
            self.errors.push(format!("{path}: {error}"));
        }
        if self.repair && result.repaired {
            self.warnings.push(format!("{path}: repaired drawable graph"));
        }
        result.graph
    }

    fn guides(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Vec<f64> {
        match obj.get(key) {
            Some(Value::Array(raw)) => {
                let mut out = Vec::with_capacity(raw.len());
                for (i, item) in raw.iter().enumerate() {
                    match item.as_f64().filter(|n| n.is_finite()) {
                        Some(n) => out.push(n),
                        None => self.violation(
                            format!("{path}: '{key}[{i}]' is not a finite number"),
                            format!("{path}: dropped invalid guide from '{key}'"),
                        ),
                    }
                }
                out
            }
            Some(Value::Null) | None => {
                self.violation(
                    format!("{path}: missing required field '{key}'"),
                    format!("{path}: inserted empty '{key}'"),
                );
                Vec::new()
            }
            Some(other) => {
                self.violation(
                    format!("{path}: '{key}' is {}, not an array", type_name(other)),
                    format!("{path}: inserted empty '{key}'"),
                );
                Vec::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // Field helpers
    // ------------------------------------------------------------------

    fn identity(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> String {
        match obj.get(key).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                self.violation(
                    format!("{path}: missing or empty '{key}'"),
                    format!("{path}: generated a new id"),
                );
                folio_model::new_id()
            }
        }
    }

    fn timestamps(&mut self, obj: &Map<String, Value>, path: &str) -> (DateTime<Utc>, DateTime<Utc>) {
        let last_modified = self.timestamp(obj, path, "lastModified");
        let created = self.timestamp(obj, path, "created");
        if created > last_modified {
            self.violation(
                format!("{path}: 'created' is later than 'lastModified'"),
                format!("{path}: clamped 'created' to 'lastModified'"),
            );
            (last_modified, last_modified)
        } else {
            (created, last_modified)
        }
    }

    fn timestamp(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> DateTime<Utc> {
        match obj
            .get(key)
            .and_then(Value::as_str)
            .and_then(|text| text.parse::<DateTime<Utc>>().ok())
        {
            Some(ts) => ts,
            None => {
                self.violation(
                    format!("{path}: missing or invalid timestamp '{key}'"),
                    format!("{path}: set '{key}' to the current time"),
                );
                Utc::now()
            }
        }
    }

    fn string_or(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
        default: &str,
    ) -> String {
        match obj.get(key).and_then(Value::as_str) {
            Some(s) => s.to_string(),
            None => {
                self.violation(
                    format!("{path}: missing or invalid '{key}'"),
                    format!("{path}: set '{key}' to '{default}'"),
                );
                default.to_string()
            }
        }
    }

    fn optional_string(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<String> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.violation(
                    format!("{path}: '{key}' is {}, not a string", type_name(other)),
                    format!("{path}: cleared '{key}'"),
                );
                None
            }
        }
    }

    fn number_or(&mut self, obj: &Map<String, Value>, path: &str, key: &str, default: f64) -> f64 {
        match obj.get(key).and_then(Value::as_f64) {
            Some(n) if n.is_finite() => n,
            _ => {
                self.violation(
                    format!("{path}: missing or invalid '{key}'"),
                    format!("{path}: set '{key}' to {default}"),
                );
                default
            }
        }
    }

    fn positive_or(&mut self, obj: &Map<String, Value>, path: &str, key: &str, default: f64) -> f64 {
        match obj.get(key).and_then(Value::as_f64) {
            Some(n) if n.is_finite() && n > 0.0 => n,
            _ => {
                self.violation(
                    format!("{path}: missing or invalid '{key}'"),
                    format!("{path}: set '{key}' to {default}"),
                );
                default
            }
        }
    }

    fn bool_or(&mut self, obj: &Map<String, Value>, path: &str, key: &str, default: bool) -> bool {
        match obj.get(key).and_then(Value::as_bool) {
            Some(b) => b,
            None => {
                self.violation(
                    format!("{path}: missing or invalid '{key}'"),
                    format!("{path}: set '{key}' to {default}"),
                );
                default
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
