//! Diagram engine seams.
//!
//! An [`EngineLoader`] produces a [`DiagramEngine`] once per renderer. The
//! engine is configured once and then renders diagrams independently.

use std::sync::Arc;

use async_trait::async_trait;

use crate::theme::EngineConfig;

/// Failure to make the engine available.
///
/// Terminal for the renderer: every widget falls back to its source view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("diagram engine unreachable: {0}")]
    Unreachable(String),
    #[error("diagram engine unhealthy: HTTP {status}")]
    Unhealthy { status: u16 },
    #[error("diagram engine load task failed: {0}")]
    Task(String),
}

/// Failure to render a single diagram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The engine rejected the diagram (syntax error, server error).
    #[error("engine error: {0}")]
    Engine(String),
    #[error("HTTP error: {0}")]
    Http(String),
    /// The engine returned something that is not usable markup.
    #[error("invalid output: {0}")]
    InvalidOutput(String),
    #[error("render task failed: {0}")]
    Task(String),
}

/// Renders diagram source to SVG markup.
#[async_trait]
pub trait DiagramEngine: Send + Sync {
    /// Apply engine-wide options. Called once, before the first render.
    fn configure(&self, config: &EngineConfig);

    /// Render `source`. `id` is unique per render request.
    async fn render(&self, id: &str, source: &str) -> Result<String, RenderError>;
}

/// Makes a [`DiagramEngine`] available.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn DiagramEngine>, LoadError>;
}
