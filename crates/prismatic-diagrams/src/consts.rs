//! Markup contract and defaults for diagram widgets.

use std::time::Duration;

/// Default Kroki server.
pub const DEFAULT_KROKI_URL: &str = "https://kroki.io";

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker on `<pre>` blocks that were already turned into widgets.
pub const PROCESSED_ATTR: &str = "data-diagram-processed";

/// Marker on placeholders whose render was already started.
pub const PLACEHOLDER_PROCESSED_ATTR: &str = "data-processed";

/// Attribute carrying the diagram id on the wrapper and its placeholder.
pub const DIAGRAM_ID_ATTR: &str = "data-diagram-id";

/// Attribute distinguishing the two toggle buttons.
pub const VIEW_ATTR: &str = "data-view";

pub const WRAPPER_CLASS: &str = "diagram-toggle-wrapper";
pub const TOGGLE_BAR_CLASS: &str = "diagram-toggle-bar";
pub const TOGGLE_LABEL_CLASS: &str = "diagram-toggle-label";
pub const TOGGLE_BUTTONS_CLASS: &str = "diagram-toggle-buttons";
pub const TOGGLE_BUTTON_CLASS: &str = "diagram-toggle-btn";
pub const VIEW_CLASS: &str = "diagram-view";
pub const SOURCE_VIEW_CLASS: &str = "diagram-source";
pub const INTERACTIVE_VIEW_CLASS: &str = "diagram-interactive";
pub const PLACEHOLDER_CLASS: &str = "mermaid";
pub const RENDERED_CLASS: &str = "mermaid-rendered";
pub const FALLBACK_CLASS: &str = "diagram-fallback";
pub const HIDDEN_CLASS: &str = "hidden";
pub const ACTIVE_CLASS: &str = "active";

/// Inline style making rendered SVG scale with its container.
pub const SVG_RESPONSIVE_STYLE: &str = "max-width: 100%; height: auto;";

/// Text shown in place of a diagram that failed to render.
pub const RENDER_FALLBACK_MESSAGE: &str = "Diagram rendering unavailable. Showing source view.";

/// Tooltip on the disabled Interactive button after a failed engine load.
pub const ENGINE_UNAVAILABLE_TITLE: &str = "Diagram engine unavailable";
