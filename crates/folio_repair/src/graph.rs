//! Drawable-graph codec: validation and auto-repair of serialized graphs.

use folio_model::defaults;
use folio_model::{DrawableEntry, DrawableGraph};
use serde_json::{Map, Value};

/// Input accepted by [`validate_graph`].
///
/// A page's graph may arrive as missing/null, as serialized text, or as an
/// already-parsed JSON value. A `Value::String` is treated as serialized
/// text and parsed first.
#[derive(Debug, Clone, Copy)]
pub enum GraphInput<'a> {
    /// No graph present (null/absent field).
    Missing,
    /// Serialized JSON text.
    Text(&'a str),
    /// Parsed JSON value.
    Value(&'a Value),
}

/// Outcome of one codec pass.
#[derive(Debug, Clone)]
pub struct GraphValidation {
    /// True when the input needed no repair.
    pub valid: bool,
    /// True when any default was substituted or any entry dropped.
    pub repaired: bool,
    /// Canonical serialized form of the resulting graph. Always parseable
    /// when auto-repair was requested.
    pub serialized: String,
    /// The typed graph, present when auto-repair was requested or the
    /// input was already clean.
    pub graph: Option<DrawableGraph>,
    /// One diagnostic per violation, in walk order.
    pub errors: Vec<String>,
}

/// Validates a drawable graph and, when `auto_repair` is set, produces a
/// repaired copy that is guaranteed to re-serialize and re-validate
/// cleanly.
///
/// Repair policy:
/// - missing/unparsable input becomes the default empty container
/// - a missing or mistyped `objects` field is coerced to an empty array
/// - entries without a recognized `type` tag are dropped, with an error
/// - image entries without a source reference are dropped, with an error
///   (no synthetic image exists)
/// - all other missing required fields get documented defaults
/// - `rotation`/`scale`/`opacity` default silently when absent
#[must_use]
pub fn validate_graph(input: GraphInput<'_>, auto_repair: bool) -> GraphValidation {
    let mut errors = Vec::new();
    let mut repaired = false;

    let container = resolve_input(input, &mut errors, &mut repaired);

    let graph = match container {
        Some(obj) => repair_container(&obj, &mut errors, &mut repaired),
        None => DrawableGraph::default(),
    };

    if repaired {
        tracing::debug!(
            dropped_or_defaulted = errors.len(),
            "repaired drawable graph"
        );
    }

    let valid = errors.is_empty();
    if auto_repair || valid {
        GraphValidation {
            valid,
            repaired: repaired && auto_repair,
            serialized: graph.to_json_string(),
            graph: Some(graph),
            errors,
        }
    } else {
        // No repair requested: report only. The serialized form echoes the
        // input so callers can still log or persist what they were given.
        GraphValidation {
            valid: false,
            repaired: false,
            serialized: echo_input(input),
            graph: None,
            errors,
        }
    }
}

/// Resolves the input to a container object, or `None` when a default
/// container must be substituted.
fn resolve_input(
    input: GraphInput<'_>,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> Option<Map<String, Value>> {
    match input {
        GraphInput::Missing => {
            errors.push("graph: missing; substituted empty container".to_string());
            *repaired = true;
            None
        }
        GraphInput::Text(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => resolve_value(&value, errors, repaired),
            Err(err) => {
                errors.push(format!("graph: unparsable JSON ({err})"));
                *repaired = true;
                None
            }
        },
        GraphInput::Value(value) => resolve_value(value, errors, repaired),
    }
}

fn resolve_value(
    value: &Value,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> Option<Map<String, Value>> {
    match value {
        Value::Null => {
            errors.push("graph: null; substituted empty container".to_string());
            *repaired = true;
            None
        }
        // Stored as a serialized string inside a larger record.
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(obj)) => Some(obj),
            Ok(_) => {
                errors.push("graph: serialized form is not an object".to_string());
                *repaired = true;
                None
            }
            Err(err) => {
                errors.push(format!("graph: unparsable JSON ({err})"));
                *repaired = true;
                None
            }
        },
        Value::Object(obj) => Some(obj.clone()),
        other => {
            errors.push(format!(
                "graph: expected an object, found {}",
                type_name(other)
            ));
            *repaired = true;
            None
        }
    }
}

fn repair_container(
    obj: &Map<String, Value>,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> DrawableGraph {
    let version = match obj.get("version") {
        Some(Value::String(v)) if !v.is_empty() => v.clone(),
        Some(other) => {
            errors.push(format!(
                "graph: invalid version tag ({}); reset to {}",
                type_name(other),
                defaults::GRAPH_FORMAT_VERSION
            ));
            *repaired = true;
            defaults::GRAPH_FORMAT_VERSION.to_string()
        }
        None => {
            errors.push("graph: missing version tag".to_string());
            *repaired = true;
            defaults::GRAPH_FORMAT_VERSION.to_string()
        }
    };

    let background = match obj.get("background") {
        Some(Value::String(b)) if !b.is_empty() => b.clone(),
        Some(other) => {
            errors.push(format!(
                "graph: invalid background ({})",
                type_name(other)
            ));
            *repaired = true;
            defaults::DEFAULT_BACKGROUND.to_string()
        }
        None => {
            errors.push("graph: missing background".to_string());
            *repaired = true;
            defaults::DEFAULT_BACKGROUND.to_string()
        }
    };

    let objects = match obj.get("objects") {
        Some(Value::Array(entries)) => repair_entries(entries, "objects", errors, repaired),
        Some(other) => {
            errors.push(format!(
                "graph: 'objects' is {}, not an array; coerced to empty",
                type_name(other)
            ));
            *repaired = true;
            Vec::new()
        }
        None => {
            errors.push("graph: missing 'objects' array; coerced to empty".to_string());
            *repaired = true;
            Vec::new()
        }
    };

    DrawableGraph {
        version,
        background,
        objects,
    }
}

fn repair_entries(
    entries: &[Value],
    path: &str,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> Vec<DrawableEntry> {
    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let entry_path = format!("{path}[{index}]");
        if let Some(repaired_entry) = repair_entry(entry, &entry_path, errors, repaired) {
            out.push(repaired_entry);
        }
    }
    out
}

/// Repairs one entry, or returns `None` when the entry must be dropped.
fn repair_entry(
    value: &Value,
    path: &str,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> Option<DrawableEntry> {
    let Some(obj) = value.as_object() else {
        errors.push(format!("{path}: not an object; entry dropped"));
        *repaired = true;
        return None;
    };

    let kind = match obj.get("type").and_then(Value::as_str) {
        Some(kind) => kind,
        None => {
            errors.push(format!("{path}: missing type tag; entry dropped"));
            *repaired = true;
            return None;
        }
    };

    let x = number_field(obj, "x", path, 0.0, errors, repaired);
    let y = number_field(obj, "y", path, 0.0, errors, repaired);
    let transform = repair_transform(obj, path, errors, repaired);

    match kind {
        "text" => Some(DrawableEntry::Text {
            x,
            y,
            text: string_field(obj, "text", path, "", errors, repaired),
            font_family: string_field(
                obj,
                "fontFamily",
                path,
                defaults::DEFAULT_FONT_FAMILY,
                errors,
                repaired,
            ),
            font_size: positive_number_field(
                obj,
                "fontSize",
                path,
                defaults::DEFAULT_FONT_SIZE,
                errors,
                repaired,
            ),
            fill: obj.get("fill").and_then(Value::as_str).map(String::from),
            transform,
        }),
        "image" => match obj.get("src").and_then(Value::as_str) {
            Some(src) if !src.is_empty() => Some(DrawableEntry::Image {
                x,
                y,
                src: src.to_string(),
                width: positive_number_field(
                    obj,
                    "width",
                    path,
                    defaults::DEFAULT_SHAPE_SIZE,
                    errors,
                    repaired,
                ),
                height: positive_number_field(
                    obj,
                    "height",
                    path,
                    defaults::DEFAULT_SHAPE_SIZE,
                    errors,
                    repaired,
                ),
                transform,
            }),
            _ => {
                // No synthetic image exists, so this defect is not
                // auto-repairable.
                errors.push(format!("{path}: image has no source; entry dropped"));
                *repaired = true;
                None
            }
        },
        "rect" | "ellipse" => {
            let width = positive_number_field(
                obj,
                "width",
                path,
                defaults::DEFAULT_SHAPE_SIZE,
                errors,
                repaired,
            );
            let height = positive_number_field(
                obj,
                "height",
                path,
                defaults::DEFAULT_SHAPE_SIZE,
                errors,
                repaired,
            );
            let fill = string_field(obj, "fill", path, defaults::DEFAULT_FILL, errors, repaired);
            Some(if kind == "rect" {
                DrawableEntry::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    transform,
                }
            } else {
                DrawableEntry::Ellipse {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    transform,
                }
            })
        }
        "line" => Some(DrawableEntry::Line {
            x,
            y,
            x2: number_field(obj, "x2", path, 0.0, errors, repaired),
            y2: number_field(obj, "y2", path, 0.0, errors, repaired),
            stroke: string_field(
                obj,
                "stroke",
                path,
                defaults::DEFAULT_STROKE,
                errors,
                repaired,
            ),
            transform,
        }),
        "group" => {
            let objects = match obj.get("objects") {
                Some(Value::Array(entries)) => {
                    repair_entries(entries, &format!("{path}.objects"), errors, repaired)
                }
                Some(other) => {
                    errors.push(format!(
                        "{path}: group 'objects' is {}, not an array; coerced to empty",
                        type_name(other)
                    ));
                    *repaired = true;
                    Vec::new()
                }
                None => {
                    errors.push(format!("{path}: group missing 'objects'; coerced to empty"));
                    *repaired = true;
                    Vec::new()
                }
            };
            Some(DrawableEntry::Group {
                x,
                y,
                objects,
                transform,
            })
        }
        other => {
            errors.push(format!(
                "{path}: unrecognized type '{other}'; entry dropped"
            ));
            *repaired = true;
            None
        }
    }
}

fn repair_transform(
    obj: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> folio_model::Transform {
    // Absent transform fields default silently; only present-but-mistyped
    // values are violations.
    let default = folio_model::Transform::default();
    folio_model::Transform {
        rotation: optional_number(obj, "rotation", path, default.rotation, errors, repaired),
        scale: optional_number(obj, "scale", path, default.scale, errors, repaired),
        opacity: optional_number(obj, "opacity", path, default.opacity, errors, repaired),
    }
}

fn optional_number(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    default: f64,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> f64 {
    match obj.get(key) {
        None => default,
        Some(value) => match value.as_f64() {
            Some(n) if n.is_finite() => n,
            _ => {
                errors.push(format!("{path}: '{key}' is not a finite number"));
                *repaired = true;
                default
            }
        },
    }
}

fn number_field(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    default: f64,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> f64 {
    match obj.get(key).and_then(Value::as_f64) {
        Some(n) if n.is_finite() => n,
        _ => {
            errors.push(format!("{path}: missing or invalid '{key}'"));
            *repaired = true;
            default
        }
    }
}

fn positive_number_field(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    default: f64,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> f64 {
    match obj.get(key).and_then(Value::as_f64) {
        Some(n) if n.is_finite() && n > 0.0 => n,
        _ => {
            errors.push(format!("{path}: missing or invalid '{key}'"));
            *repaired = true;
            default
        }
    }
}

fn string_field(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    default: &str,
    errors: &mut Vec<String>,
    repaired: &mut bool,
) -> String {
    match obj.get(key).and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => {
            errors.push(format!("{path}: missing or invalid '{key}'"));
            *repaired = true;
            default.to_string()
        }
    }
}

fn echo_input(input: GraphInput<'_>) -> String {
    match input {
        GraphInput::Missing => "null".to_string(),
        GraphInput::Text(text) => text.to_string(),
        GraphInput::Value(value) => value.to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_input_yields_default_container() {
        let result = validate_graph(GraphInput::Missing, true);
        assert!(!result.valid);
        assert!(result.repaired);
        let value: Value = serde_json::from_str(&result.serialized).unwrap();
        assert_eq!(value["objects"], json!([]));
        assert_eq!(value["background"], "white");
    }

    #[test]
    fn unparsable_text_yields_default_container() {
        let result = validate_graph(GraphInput::Text("{not json"), true);
        assert!(!result.valid);
        assert_eq!(result.graph.as_ref().unwrap(), &DrawableGraph::default());
    }

    #[test]
    fn clean_graph_passes_untouched() {
        let graph = DrawableGraph::default();
        let text = graph.to_json_string();
        let result = validate_graph(GraphInput::Text(&text), true);
        assert!(result.valid, "errors: {:?}", result.errors);
        assert!(!result.repaired);
        assert_eq!(result.graph.unwrap(), graph);
    }

    #[test]
    fn untagged_entry_is_dropped_with_error() {
        let value = json!({
            "version": "folio/1",
            "background": "white",
            "objects": [{"x": 1, "y": 2}]
        });
        let result = validate_graph(GraphInput::Value(&value), true);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("missing type tag")));
        assert!(result.graph.unwrap().objects.is_empty());
    }

    #[test]
    fn sourceless_image_is_dropped_not_synthesized() {
        let value = json!({
            "version": "folio/1",
            "background": "white",
            "objects": [
                {"type": "image", "x": 0, "y": 0, "width": 50, "height": 50},
                {"type": "rect", "x": 0, "y": 0, "width": 10, "height": 10, "fill": "#fff"}
            ]
        });
        let result = validate_graph(GraphInput::Value(&value), true);
        let graph = result.graph.unwrap();
        assert_eq!(graph.objects.len(), 1);
        assert_eq!(graph.objects[0].kind(), "rect");
        assert!(result.errors.iter().any(|e| e.contains("no source")));
    }

    #[test]
    fn text_entry_gets_default_font() {
        let value = json!({
            "version": "folio/1",
            "background": "white",
            "objects": [{"type": "text", "x": 5, "y": 5, "text": "hello"}]
        });
        let result = validate_graph(GraphInput::Value(&value), true);
        match &result.graph.unwrap().objects[0] {
            DrawableEntry::Text {
                font_family,
                font_size,
                ..
            } => {
                assert_eq!(font_family, defaults::DEFAULT_FONT_FAMILY);
                assert_eq!(*font_size, defaults::DEFAULT_FONT_SIZE);
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn shape_without_dimensions_gets_defaults() {
        let value = json!({
            "version": "folio/1",
            "background": "white",
            "objects": [{"type": "ellipse", "x": 0, "y": 0}]
        });
        let result = validate_graph(GraphInput::Value(&value), true);
        match &result.graph.unwrap().objects[0] {
            DrawableEntry::Ellipse {
                width,
                height,
                fill,
                ..
            } => {
                assert_eq!(*width, defaults::DEFAULT_SHAPE_SIZE);
                assert_eq!(*height, defaults::DEFAULT_SHAPE_SIZE);
                assert_eq!(fill, defaults::DEFAULT_FILL);
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn group_repairs_nested_entries() {
        let value = json!({
            "version": "folio/1",
            "background": "white",
            "objects": [{
                "type": "group", "x": 0, "y": 0,
                "objects": [
                    {"type": "text", "x": 1, "y": 1, "text": "nested"},
                    {"type": "unknown-widget", "x": 2, "y": 2}
                ]
            }]
        });
        let result = validate_graph(GraphInput::Value(&value), true);
        match &result.graph.unwrap().objects[0] {
            DrawableEntry::Group { objects, .. } => {
                assert_eq!(objects.len(), 1);
                assert_eq!(objects[0].kind(), "text");
            }
            other => panic!("unexpected entry: {other:?}"),
        }
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("objects[0].objects[1]")));
    }

    #[test]
    fn objects_field_coerced_to_empty_when_mistyped() {
        let value = json!({"version": "folio/1", "background": "white", "objects": 7});
        let result = validate_graph(GraphInput::Value(&value), true);
        assert!(!result.valid);
        assert_eq!(result.graph.unwrap().objects.len(), 0);
    }

    #[test]
    fn without_repair_no_graph_is_produced() {
        let result = validate_graph(GraphInput::Text("{broken"), false);
        assert!(!result.valid);
        assert!(result.graph.is_none());
        assert!(!result.repaired);
        assert_eq!(result.serialized, "{broken");
    }

    #[test]
    fn repaired_output_passes_second_pass() {
        let value = json!({
            "objects": [
                {"type": "text", "x": 1, "y": 2},
                {"type": "image", "x": 0, "y": 0},
                {"type": "blob"},
                42
            ]
        });
        let first = validate_graph(GraphInput::Value(&value), true);
        assert!(!first.valid);

        let second = validate_graph(GraphInput::Text(&first.serialized), true);
        assert!(second.valid, "second pass errors: {:?}", second.errors);
        assert!(!second.repaired);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Arbitrary JSON values, including deeply broken graph shapes.
        fn arb_json(depth: u32) -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(|n| json!(n)),
                any::<f64>().prop_map(|n| json!(n)),
                "[a-z]{0,12}".prop_map(Value::String),
            ];
            leaf.prop_recursive(depth, 64, 8, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                    prop::collection::hash_map("[a-z]{1,10}", inner, 0..6).prop_map(|m| {
                        Value::Object(m.into_iter().collect())
                    }),
                ]
            })
        }

        proptest! {
            /// Repair totality: any input repairs to a parseable container
            /// with an objects array.
            #[test]
            fn repair_is_total(value in arb_json(3)) {
                let result = validate_graph(GraphInput::Value(&value), true);
                let parsed: Value = serde_json::from_str(&result.serialized).unwrap();
                prop_assert!(parsed.get("objects").map_or(false, Value::is_array));
            }

            /// Idempotence: a repaired graph re-validates cleanly.
            #[test]
            fn repair_is_idempotent(value in arb_json(3)) {
                let first = validate_graph(GraphInput::Value(&value), true);
                let second = validate_graph(GraphInput::Text(&first.serialized), true);
                prop_assert!(second.valid, "second pass errors: {:?}", second.errors);
            }

            /// Raw text input never panics, whatever it contains.
            #[test]
            fn arbitrary_text_never_panics(text in ".{0,64}") {
                let _ = validate_graph(GraphInput::Text(&text), true);
                let _ = validate_graph(GraphInput::Text(&text), false);
            }
        }
    }
}
