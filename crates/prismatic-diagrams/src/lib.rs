//! Mermaid diagram toggles for Prismatic pages.
//!
//! Diagram code blocks are replaced by a widget with a Source and an
//! Interactive view. The diagram engine is loaded lazily, once, and every
//! diagram renders independently; failures degrade to the source view.
//!
//! # Architecture
//!
//! - [`detect`]: explicit (`language-mermaid`) and heuristic block detection
//! - [`ToggleWidget`]: widget markup and view switching
//! - [`DiagramRenderer`]: scan, engine load, async per-diagram rendering
//! - [`DiagramEngine`] / [`EngineLoader`]: engine seams, with a Kroki implementation
//! - [`RenderCache`]: in-memory output cache keyed by [`DiagramKey`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use prismatic_diagrams::{DiagramRenderer, KrokiLoader};
//! use prismatic_dom::Page;
//!
//! # async fn run() -> Result<(), prismatic_dom::DomError> {
//! let page = Page::parse("<pre>graph TD\nA--&gt;B</pre>")?;
//! let renderer = DiagramRenderer::new(Arc::new(KrokiLoader::default()));
//! let report = renderer.scan_and_process(&page).await;
//! println!("{} diagrams, {} rendered", report.diagrams.len(), report.rendered.len());
//! # Ok(())
//! # }
//! ```

mod cache;
mod consts;
pub mod detect;
mod diagram;
mod engine;
mod kroki;
mod renderer;
mod state;
mod theme;
mod widget;

pub use cache::{DiagramKey, RenderCache};
pub use consts::{
    DEFAULT_KROKI_URL, DEFAULT_TIMEOUT, ENGINE_UNAVAILABLE_TITLE, PROCESSED_ATTR,
    RENDER_FALLBACK_MESSAGE, WRAPPER_CLASS,
};
pub use detect::is_diagram_source;
pub use diagram::{DiagramDescriptor, DiagramId, RenderState};
pub use engine::{DiagramEngine, EngineLoader, LoadError, RenderError};
pub use kroki::{KrokiEngine, KrokiLoader, create_agent};
pub use renderer::{DiagramRenderer, RenderReport, strip_google_fonts_import};
pub use state::RendererState;
pub use theme::{
    EngineConfig, FlowchartConfig, GanttConfig, SequenceConfig, ThemeMode, ThemePreset,
    ThemeVariables,
};
pub use widget::{ToggleWidget, View};
