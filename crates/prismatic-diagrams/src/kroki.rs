//! Kroki-backed diagram engine.
//!
//! The engine is "loaded" by probing the server's health endpoint, so an
//! unreachable server degrades the page to source views up front instead of
//! failing every diagram individually. Requests run on the blocking pool
//! since `ureq` is synchronous.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use ureq::Agent;

use crate::consts::{DEFAULT_KROKI_URL, DEFAULT_TIMEOUT};
use crate::engine::{DiagramEngine, EngineLoader, LoadError, RenderError};
use crate::theme::EngineConfig;

/// Create HTTP agent with the specified timeout.
///
/// Status codes are returned as responses so error bodies can be reported.
#[must_use]
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Loads a [`KrokiEngine`] after checking the server is up.
#[derive(Debug, Clone)]
pub struct KrokiLoader {
    url: String,
    timeout: Duration,
}

impl Default for KrokiLoader {
    fn default() -> Self {
        Self::new(DEFAULT_KROKI_URL)
    }
}

impl KrokiLoader {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EngineLoader for KrokiLoader {
    async fn load(&self) -> Result<Arc<dyn DiagramEngine>, LoadError> {
        let agent = create_agent(self.timeout);
        let health_url = format!("{}/health", self.url);
        tracing::info!(url = %self.url, "Loading Kroki diagram engine");

        let probe = agent.clone();
        let status = tokio::task::spawn_blocking(move || {
            probe
                .get(&health_url)
                .call()
                .map(|response| response.status().as_u16())
                .map_err(|e| LoadError::Unreachable(e.to_string()))
        })
        .await
        .map_err(|e| LoadError::Task(e.to_string()))??;

        if status >= 400 {
            return Err(LoadError::Unhealthy { status });
        }

        Ok(Arc::new(KrokiEngine {
            agent,
            url: self.url.clone(),
            config: OnceLock::new(),
        }))
    }
}

/// Renders Mermaid diagrams through a Kroki server.
pub struct KrokiEngine {
    agent: Agent,
    url: String,
    /// Serialized engine config, prepended to each diagram as an init directive.
    config: OnceLock<String>,
}

#[async_trait]
impl DiagramEngine for KrokiEngine {
    fn configure(&self, config: &EngineConfig) {
        if self.config.set(config.to_json()).is_err() {
            tracing::debug!("Kroki engine already configured");
        }
    }

    async fn render(&self, id: &str, source: &str) -> Result<String, RenderError> {
        let body = with_init_directive(self.config.get().map(String::as_str), source);
        let url = format!("{}/mermaid/svg", self.url);
        let agent = self.agent.clone();
        tracing::debug!(id, url = %url, "Rendering diagram via Kroki");

        tokio::task::spawn_blocking(move || send_diagram_request(&agent, &url, &body))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }
}

/// Prefix the source with the engine config as a Mermaid init directive.
fn with_init_directive(config: Option<&str>, source: &str) -> String {
    match config {
        Some(config) => format!("%%{{init: {config}}}%%\n{source}"),
        None => source.to_owned(),
    }
}

/// POST a diagram and return the SVG body.
///
/// Handles HTTP errors by reading the response body for error details.
fn send_diagram_request(agent: &Agent, url: &str, body: &str) -> Result<String, RenderError> {
    let response = agent
        .post(url)
        .header("Content-Type", "text/plain")
        .send(body.as_bytes())
        .map_err(|e| RenderError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        return Err(RenderError::Engine(format!("HTTP {status}: {error_body}")));
    }

    body.read_to_string()
        .map_err(|e| RenderError::InvalidOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemePreset;

    #[test]
    fn test_init_directive_prefix() {
        let config = EngineConfig::for_preset(ThemePreset::Light).to_json();
        let body = with_init_directive(Some(&config), "graph TD\nA-->B");
        assert!(body.starts_with("%%{init: {\"startOnLoad\":false,"));
        assert!(body.ends_with("}%%\ngraph TD\nA-->B"));
    }

    #[test]
    fn test_unconfigured_sends_source_only() {
        assert_eq!(with_init_directive(None, "pie"), "pie");
    }

    #[test]
    fn test_loader_trims_trailing_slash() {
        let loader = KrokiLoader::new("http://localhost:8000/");
        assert_eq!(loader.url(), "http://localhost:8000");
        assert_eq!(KrokiLoader::default().url(), DEFAULT_KROKI_URL);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_load() {
        let loader = KrokiLoader::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(2));
        let result = loader.load().await;
        assert!(matches!(result, Err(LoadError::Unreachable(_))));
    }
}
