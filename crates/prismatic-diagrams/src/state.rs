//! Renderer-wide state: engine slot, id counter and engine configuration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::OnceCell;

use crate::diagram::DiagramId;
use crate::engine::{DiagramEngine, EngineLoader, LoadError};
use crate::theme::EngineConfig;

type EngineSlot = Result<Arc<dyn DiagramEngine>, LoadError>;

/// State shared by every scan of one renderer. Never reset.
#[derive(Default)]
pub struct RendererState {
    /// Load outcome. Initialized at most once; concurrent callers share the attempt.
    engine: OnceCell<EngineSlot>,
    /// Last issued diagram number.
    counter: AtomicU64,
    /// Configuration the engine was initialized with.
    config: OnceLock<EngineConfig>,
}

impl RendererState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next diagram id. Ids start at 1 and are never reused.
    pub fn next_id(&self) -> DiagramId {
        DiagramId(self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Load the engine on first call; later calls return the same outcome.
    pub async fn engine(
        &self,
        loader: &dyn EngineLoader,
    ) -> Result<Arc<dyn DiagramEngine>, LoadError> {
        self.engine
            .get_or_init(|| async {
                let result = loader.load().await;
                match &result {
                    Ok(_) => tracing::info!("Diagram engine loaded"),
                    Err(e) => tracing::warn!(error = %e, "Diagram engine failed to load"),
                }
                result
            })
            .await
            .clone()
    }

    /// Load error, if the load already happened and failed.
    #[must_use]
    pub fn load_error(&self) -> Option<&LoadError> {
        self.engine.get().and_then(|slot| slot.as_ref().err())
    }

    /// Configure `engine` on first call. Returns the configuration in effect.
    pub fn configure(
        &self,
        engine: &dyn DiagramEngine,
        make_config: impl FnOnce() -> EngineConfig,
    ) -> &EngineConfig {
        self.config.get_or_init(|| {
            let config = make_config();
            tracing::debug!(preset = %config.preset, "Configuring diagram engine");
            engine.configure(&config);
            config
        })
    }

    /// Configuration in effect, if the engine was configured.
    #[must_use]
    pub fn config(&self) -> Option<&EngineConfig> {
        self.config.get()
    }
}
