//! Documented repair defaults.
//!
//! Every auto-repair performed by the validator or the graph codec
//! substitutes one of these values. Keeping them in one place makes the
//! repair policy reviewable and keeps the validator idempotent: a repaired
//! document re-validates cleanly because it is built from these exact
//! defaults.

/// Format tag written into every drawable-graph container.
pub const GRAPH_FORMAT_VERSION: &str = "folio/1";

/// Background used when a graph has none.
pub const DEFAULT_BACKGROUND: &str = "white";

/// Title substituted for a missing or mistyped document title.
pub const DEFAULT_TITLE: &str = "Untitled Document";

/// Creator substituted for a missing creator field.
pub const DEFAULT_CREATOR: &str = "unknown";

/// Name substituted for a master page with none.
pub const DEFAULT_MASTER_NAME: &str = "Untitled Master";

/// Font family substituted for text entries with none.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Font size (points) substituted for text entries with none.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Fill substituted for shape entries with none.
pub const DEFAULT_FILL: &str = "#cccccc";

/// Stroke substituted for line entries with none.
pub const DEFAULT_STROKE: &str = "#000000";

/// Width and height substituted for shape entries missing dimensions.
pub const DEFAULT_SHAPE_SIZE: f64 = 100.0;

/// US Letter width in points.
pub const DEFAULT_PAGE_WIDTH: f64 = 612.0;

/// US Letter height in points.
pub const DEFAULT_PAGE_HEIGHT: f64 = 792.0;

/// Unit tag for page geometry.
pub const DEFAULT_PAGE_UNIT: &str = "pt";

/// Margin (points) on all four sides of a default page.
pub const DEFAULT_MARGIN: f64 = 36.0;

/// Grid cell size (points) for a default grid.
pub const DEFAULT_GRID_SIZE: f64 = 12.0;
