//! Page processing pipeline: code block normalization, then diagram toggles.

use std::sync::Arc;
use std::time::Duration;

use prismatic_config::Config;
use prismatic_diagrams::{DiagramRenderer, KrokiLoader, RenderReport};
use prismatic_dom::{Page, PageChanges};
use prismatic_highlight::{CodeBlockNormalizer, LanguageAliases, NormalizeReport};

/// Outcome of one pipeline run.
#[derive(Debug, Default)]
pub(crate) struct PipelineReport {
    pub normalize: NormalizeReport,
    /// `None` when diagram processing is disabled.
    pub diagrams: Option<RenderReport>,
}

/// Runs both processors over a page.
pub(crate) struct Pipeline {
    normalizer: CodeBlockNormalizer,
    renderer: Option<DiagramRenderer>,
}

impl Pipeline {
    pub(crate) fn new(normalizer: CodeBlockNormalizer, renderer: Option<DiagramRenderer>) -> Self {
        Self {
            normalizer,
            renderer,
        }
    }

    /// Build the pipeline described by `config`, using Kroki as the diagram engine.
    pub(crate) fn from_config(config: &Config) -> Self {
        let normalizer = CodeBlockNormalizer::new()
            .with_aliases(LanguageAliases::new().with_extra(&config.highlight.aliases))
            .with_default_theme(config.highlight.default_theme.clone());

        let renderer = config.diagrams.enabled.then(|| {
            let loader = KrokiLoader::new(config.diagrams.kroki_url.as_str())
                .with_timeout(config.diagrams.timeout());
            DiagramRenderer::new(Arc::new(loader)).with_theme(config.diagrams.theme.into())
        });

        Self::new(normalizer, renderer)
    }

    /// Process the page once. Safe to repeat; already processed blocks are skipped.
    pub(crate) async fn run(&self, page: &Page) -> PipelineReport {
        let normalize = page.with_document(|doc| self.normalizer.apply(doc));
        let diagrams = match &self.renderer {
            Some(renderer) => Some(renderer.scan_and_process(page).await),
            None => None,
        };
        tracing::debug!(
            tagged = normalize.tagged,
            diagrams = diagrams.as_ref().map_or(0, |r| r.diagrams.len()),
            "Pipeline run finished"
        );
        PipelineReport {
            normalize,
            diagrams,
        }
    }

    /// Wait for the next settled batch of changes and process it.
    ///
    /// Returns `None` when the page behind `changes` is gone.
    pub(crate) async fn observe(
        &self,
        page: &Page,
        changes: &mut PageChanges,
        debounce: Duration,
    ) -> Option<PipelineReport> {
        let generation = changes.settled(debounce).await?;
        tracing::info!(generation, "Page changed, re-running pipeline");
        Some(self.run(page).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use prismatic_diagrams::{
        DiagramEngine, DiagramId, EngineConfig, EngineLoader, LoadError, RenderError, ThemeMode,
    };
    use prismatic_dom::DEFAULT_DEBOUNCE;

    use super::*;

    struct StubEngine;

    #[async_trait]
    impl DiagramEngine for StubEngine {
        fn configure(&self, _config: &EngineConfig) {}

        async fn render(&self, _id: &str, source: &str) -> Result<String, RenderError> {
            if source.contains("broken") {
                Err(RenderError::Engine("parse error".to_owned()))
            } else {
                Ok("<svg></svg>".to_owned())
            }
        }
    }

    #[derive(Default)]
    struct StubLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl EngineLoader for StubLoader {
        async fn load(&self) -> Result<Arc<dyn DiagramEngine>, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubEngine))
        }
    }

    fn stub_pipeline(loader: &Arc<StubLoader>) -> Pipeline {
        let loader: Arc<dyn EngineLoader> = Arc::<StubLoader>::clone(loader);
        Pipeline::new(
            CodeBlockNormalizer::new(),
            Some(DiagramRenderer::new(loader).with_theme(ThemeMode::Light)),
        )
    }

    const PAGE: &str = "<html><body>\
        <pre><code data-lang=\"sh\">ls -la</code></pre>\
        <pre><code class=\"language-mermaid\">graph TD\nA--&gt;B</code></pre>\
        </body></html>";

    #[tokio::test]
    async fn test_run_normalizes_and_renders() {
        let loader = Arc::new(StubLoader::default());
        let pipeline = stub_pipeline(&loader);
        let page = Page::parse(PAGE).unwrap();

        let report = pipeline.run(&page).await;

        assert_eq!(report.normalize.tagged, 1);
        let diagrams = report.diagrams.unwrap();
        assert_eq!(diagrams.rendered, vec![DiagramId(1)]);
        assert!(diagrams.failed.is_empty());

        let html = page.to_html();
        assert!(html.contains("class=\"language-bash\""));
        assert!(html.contains("data-lang=\"sh\""));
        assert!(html.contains("mermaid-rendered"));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let loader = Arc::new(StubLoader::default());
        let pipeline = stub_pipeline(&loader);
        let page = Page::parse(PAGE).unwrap();

        pipeline.run(&page).await;
        let first = page.to_html();
        let second_report = pipeline.run(&page).await;

        assert_eq!(page.to_html(), first);
        assert!(second_report.diagrams.unwrap().is_empty());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_processes_appended_content() {
        let loader = Arc::new(StubLoader::default());
        let pipeline = stub_pipeline(&loader);
        let page = Page::parse(PAGE).unwrap();
        pipeline.run(&page).await;

        let mut changes = page.subscribe();
        page.append_html("<pre><code data-lang=\"py\">print(1)</code></pre>")
            .unwrap();
        page.append_html("<pre>sequenceDiagram\nA-&gt;&gt;B: hi</pre>")
            .unwrap();

        let report = pipeline
            .observe(&page, &mut changes, DEFAULT_DEBOUNCE)
            .await
            .unwrap();

        assert_eq!(report.normalize.tagged, 2);
        let diagrams = report.diagrams.unwrap();
        assert_eq!(diagrams.diagrams.len(), 1);
        assert_eq!(diagrams.diagrams[0].id, DiagramId(2));
        assert_eq!(diagrams.rendered, vec![DiagramId(2)]);

        let html = page.to_html();
        assert!(html.contains("class=\"language-python\""));
        assert_eq!(html.matches("class=\"diagram-toggle-wrapper\"").count(), 2);
    }

    #[tokio::test]
    async fn test_failing_diagram_is_isolated() {
        let loader = Arc::new(StubLoader::default());
        let pipeline = stub_pipeline(&loader);
        let page = Page::parse(
            "<body><pre><code class=\"language-mermaid\">graph TD\nA--&gt;B</code></pre>\
             <pre><code class=\"language-mermaid\">graph TD\nbroken</code></pre></body>",
        )
        .unwrap();

        let diagrams = pipeline.run(&page).await.diagrams.unwrap();

        assert_eq!(diagrams.rendered, vec![DiagramId(1)]);
        assert_eq!(diagrams.failed.len(), 1);
        assert_eq!(diagrams.failed[0].0, DiagramId(2));
    }

    #[tokio::test]
    async fn test_disabled_diagrams_leave_blocks_untouched() {
        let mut config = Config::default();
        config.diagrams.enabled = false;
        let pipeline = Pipeline::from_config(&config);
        let page = Page::parse(PAGE).unwrap();

        let report = pipeline.run(&page).await;

        assert!(report.diagrams.is_none());
        assert!(!page.to_html().contains("diagram-toggle-wrapper"));
    }

    #[tokio::test]
    async fn test_from_config_applies_aliases() {
        let mut config = Config::default();
        config.diagrams.enabled = false;
        config
            .highlight
            .aliases
            .insert("tf".to_owned(), "hcl".to_owned());
        let pipeline = Pipeline::from_config(&config);
        let page = Page::parse("<pre><code data-lang=\"tf\">x = 1</code></pre>").unwrap();

        pipeline.run(&page).await;

        assert!(page.to_html().contains("class=\"language-hcl\""));
    }

    #[test]
    fn test_from_config_uses_configured_theme() {
        let mut config = Config::default();
        config.diagrams.enabled = false;
        config.diagrams.theme = prismatic_config::DiagramTheme::Dark;
        let pipeline = Pipeline::from_config(&config);
        assert!(pipeline.renderer.is_none());

        config.diagrams.enabled = true;
        let pipeline = Pipeline::from_config(&config);
        assert_eq!(pipeline.renderer.unwrap().theme(), ThemeMode::Dark);
    }
}
