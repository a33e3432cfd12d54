//! Drawable graphs and their typed entries.

use crate::defaults;
use serde::{Deserialize, Serialize};

/// The serialized collection of visual elements belonging to one page or
/// master page.
///
/// Wire form is a JSON container:
///
/// ```json
/// {"version":"folio/1","background":"white","objects":[...]}
/// ```
///
/// A valid graph always carries an `objects` array, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawableGraph {
    /// Graph format tag.
    pub version: String,
    /// Page background value (color name or hex).
    pub background: String,
    /// Ordered drawable entries.
    #[serde(default)]
    pub objects: Vec<DrawableEntry>,
}

impl DrawableGraph {
    /// Serializes the graph to its canonical JSON text form.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        // A struct of strings and plain enums cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| Self::default().to_json_string())
    }

    /// Returns true when the graph holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for DrawableGraph {
    fn default() -> Self {
        Self {
            version: defaults::GRAPH_FORMAT_VERSION.to_string(),
            background: defaults::DEFAULT_BACKGROUND.to_string(),
            objects: Vec::new(),
        }
    }
}

/// Common optional transform fields shared by every entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Uniform scale factor.
    #[serde(default = "Transform::unit")]
    pub scale: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "Transform::unit")]
    pub opacity: f64,
}

impl Transform {
    fn unit() -> f64 {
        1.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

/// One typed visual element within a [`DrawableGraph`].
///
/// A closed tagged union over the recognized entry kinds; the `type` field
/// is the required discriminant on the wire. Unrecognized or untagged
/// entries never reach this type — the graph codec drops them during
/// repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum DrawableEntry {
    /// A text run.
    Text {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Text content.
        text: String,
        /// Font family name.
        font_family: String,
        /// Font size in points.
        font_size: f64,
        /// Optional text fill.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        /// Common transform fields.
        #[serde(flatten)]
        transform: Transform,
    },
    /// A placed image.
    Image {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Source reference. Required; an image without one is not
        /// repairable and is dropped by the codec.
        src: String,
        /// Placed width.
        width: f64,
        /// Placed height.
        height: f64,
        /// Common transform fields.
        #[serde(flatten)]
        transform: Transform,
    },
    /// A rectangle.
    Rect {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Fill value.
        fill: String,
        /// Common transform fields.
        #[serde(flatten)]
        transform: Transform,
    },
    /// An ellipse.
    Ellipse {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Fill value.
        fill: String,
        /// Common transform fields.
        #[serde(flatten)]
        transform: Transform,
    },
    /// A straight line segment.
    Line {
        /// Start x.
        x: f64,
        /// Start y.
        y: f64,
        /// End x.
        x2: f64,
        /// End y.
        y2: f64,
        /// Stroke value.
        stroke: String,
        /// Common transform fields.
        #[serde(flatten)]
        transform: Transform,
    },
    /// A group of nested entries.
    Group {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Nested entries.
        objects: Vec<DrawableEntry>,
        /// Common transform fields.
        #[serde(flatten)]
        transform: Transform,
    },
}

impl DrawableEntry {
    /// Returns the wire discriminant for this entry.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Rect { .. } => "rect",
            Self::Ellipse { .. } => "ellipse",
            Self::Line { .. } => "line",
            Self::Group { .. } => "group",
        }
    }
}
