//! Diagram toggle renderer.
//!
//! Each diagram block moves through `Unprocessed -> Wrapped(Pending) ->
//! Rendered | Failed`. Wrapping is synchronous and happens under exclusive
//! access to the document. Rendering happens in two suspension points: the
//! shared engine load, and one independent task per diagram.
//!
//! The two failure paths differ on purpose. A failed engine load is
//! page-wide and terminal: every widget shows its source and the Interactive
//! button is disabled. A failed render only affects its own widget, which
//! falls back to the source view with the Interactive button still usable.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use prismatic_dom::{Document, NodeId, Page};
use regex::Regex;
use tokio::task::JoinSet;

use crate::cache::{DiagramKey, RenderCache};
use crate::consts::{
    DIAGRAM_ID_ATTR, ENGINE_UNAVAILABLE_TITLE, FALLBACK_CLASS, PLACEHOLDER_CLASS,
    PLACEHOLDER_PROCESSED_ATTR, RENDER_FALLBACK_MESSAGE, RENDERED_CLASS, SVG_RESPONSIVE_STYLE,
};
use crate::detect::find_candidates;
use crate::diagram::{DiagramDescriptor, DiagramId, RenderState};
use crate::engine::{EngineLoader, LoadError, RenderError};
use crate::state::RendererState;
use crate::theme::{EngineConfig, ThemeMode};
use crate::widget::{ToggleWidget, View};

static GOOGLE_FONTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@import\s+url\([^)]*fonts\.googleapis\.com[^)]*\)\s*;?").unwrap()
});

/// Outcome of one [`DiagramRenderer::scan_and_process`] call.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Diagrams wrapped by this call, with their final state.
    pub diagrams: Vec<DiagramDescriptor>,
    /// Placeholders rendered successfully.
    pub rendered: Vec<DiagramId>,
    /// Placeholders whose render failed.
    pub failed: Vec<(DiagramId, RenderError)>,
    /// Renders served from the cache.
    pub cache_hits: usize,
    /// Set when the engine is unavailable.
    pub load_error: Option<LoadError>,
}

impl RenderReport {
    /// Whether the call did nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagrams.is_empty()
            && self.rendered.is_empty()
            && self.failed.is_empty()
            && self.load_error.is_none()
    }
}

/// A placeholder claimed for rendering.
struct Claim {
    node: NodeId,
    id: DiagramId,
    source: String,
}

/// Detects diagram blocks, wraps them in toggle widgets and renders them.
pub struct DiagramRenderer {
    loader: Arc<dyn EngineLoader>,
    state: RendererState,
    cache: RenderCache,
    theme: ThemeMode,
}

impl DiagramRenderer {
    #[must_use]
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            state: RendererState::new(),
            cache: RenderCache::new(),
            theme: ThemeMode::Auto,
        }
    }

    /// Force a theme instead of following the page.
    #[must_use]
    pub fn with_theme(mut self, theme: ThemeMode) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    #[must_use]
    pub fn state(&self) -> &RendererState {
        &self.state
    }

    #[must_use]
    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Wrap every unprocessed diagram block in a toggle widget.
    ///
    /// If the engine already failed to load, the new widgets get the
    /// page-wide fallback right away.
    pub fn scan(&self, doc: &mut Document) -> Vec<DiagramDescriptor> {
        let candidates = find_candidates(doc);
        let mut wrapped = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = self.state.next_id();
            ToggleWidget::wrap(doc, candidate.pre, &candidate.source, id);
            tracing::debug!(id = %id, detection = ?candidate.detection, "Wrapped diagram block");
            wrapped.push(DiagramDescriptor {
                id,
                source: candidate.source,
                state: RenderState::Pending,
            });
        }

        if !wrapped.is_empty() && self.state.load_error().is_some() {
            apply_load_fallback(doc);
        }
        wrapped
    }

    /// Wrap new diagram blocks, load the engine if needed, and render every
    /// unprocessed placeholder.
    ///
    /// Idempotent: processed blocks and placeholders are skipped, so calling
    /// it again after the page changes only touches new content.
    pub async fn scan_and_process(&self, page: &Page) -> RenderReport {
        let mut report = RenderReport {
            diagrams: page.with_document(|doc| self.scan(doc)),
            ..RenderReport::default()
        };

        let pending = page.with_document(|doc| !pending_placeholders(doc).is_empty());
        if !pending {
            return report;
        }

        let engine = match self.state.engine(self.loader.as_ref()).await {
            Ok(engine) => engine,
            Err(e) => {
                let widgets = page.with_document(apply_load_fallback);
                tracing::warn!(error = %e, widgets, "Showing source view for all diagrams");
                report.load_error = Some(e);
                return report;
            }
        };

        let theme = self.theme;
        let config = self.state.configure(engine.as_ref(), || {
            EngineConfig::for_preset(page.with_document(|doc| theme.resolve(doc)))
        });
        let preset = config.preset.to_string();

        let claims = page.with_document(|doc| self.claim_placeholders(doc));
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::new();
        for claim in claims {
            let key = DiagramKey {
                source: &claim.source,
                theme: &preset,
            };
            if let Some(output) = self.cache.get(&key) {
                tracing::debug!(id = %claim.id, "Diagram served from cache");
                report.cache_hits += 1;
                self.complete(page, &claim, Ok(output), &preset, &mut report);
                continue;
            }

            let engine = Arc::clone(&engine);
            let render_id = format!("mermaid-svg-{}", claim.id.0);
            let source = claim.source.clone();
            let handle = tasks.spawn(async move { engine.render(&render_id, &source).await });
            in_flight.insert(handle.id(), claim);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (task_id, result) = match joined {
                Ok((task_id, result)) => (task_id, result),
                Err(e) => {
                    tracing::error!(error = %e, "Diagram render task panicked");
                    (e.id(), Err(RenderError::Task(e.to_string())))
                }
            };
            if let Some(claim) = in_flight.remove(&task_id) {
                self.complete(page, &claim, result, &preset, &mut report);
            }
        }

        for descriptor in &mut report.diagrams {
            if report.rendered.contains(&descriptor.id) {
                descriptor.state = RenderState::Rendered;
            } else if report.failed.iter().any(|(id, _)| *id == descriptor.id) {
                descriptor.state = RenderState::Failed;
            }
        }

        tracing::info!(
            wrapped = report.diagrams.len(),
            rendered = report.rendered.len(),
            failed = report.failed.len(),
            cache_hits = report.cache_hits,
            "Diagrams processed"
        );
        report
    }

    /// Mark unprocessed placeholders as processed and take their sources.
    fn claim_placeholders(&self, doc: &mut Document) -> Vec<Claim> {
        pending_placeholders(doc)
            .into_iter()
            .map(|node| {
                doc.set_attr(node, PLACEHOLDER_PROCESSED_ATTR, "true");
                let id = doc
                    .attr(node, DIAGRAM_ID_ATTR)
                    .and_then(DiagramId::parse)
                    .unwrap_or_else(|| self.state.next_id());
                Claim {
                    node,
                    id,
                    source: doc.text_content(node).trim().to_owned(),
                }
            })
            .collect()
    }

    /// Apply a render outcome to its placeholder.
    fn complete(
        &self,
        page: &Page,
        claim: &Claim,
        result: Result<String, RenderError>,
        preset: &str,
        report: &mut RenderReport,
    ) {
        let outcome = result.and_then(|output| {
            page.with_document(|doc| apply_rendered(doc, claim.node, &output))?;
            Ok(output)
        });
        match outcome {
            Ok(output) => {
                let key = DiagramKey {
                    source: &claim.source,
                    theme: preset,
                };
                self.cache.insert(&key, output);
                report.rendered.push(claim.id);
            }
            Err(e) => {
                tracing::warn!(id = %claim.id, error = %e, "Diagram render failed");
                page.with_document(|doc| apply_render_fallback(doc, claim.node));
                report.failed.push((claim.id, e));
            }
        }
    }
}

/// `.mermaid` placeholders not yet claimed.
fn pending_placeholders(doc: &Document) -> Vec<NodeId> {
    doc.select(doc.root(), |doc, id| {
        doc.has_class(id, PLACEHOLDER_CLASS) && !doc.has_attr(id, PLACEHOLDER_PROCESSED_ATTR)
    })
}

/// Replace placeholder content with rendered markup.
///
/// Output that does not parse leaves the placeholder untouched and is reported
/// as a render failure.
fn apply_rendered(doc: &mut Document, placeholder: NodeId, output: &str) -> Result<(), RenderError> {
    let markup = strip_google_fonts_import(output.trim());
    doc.set_inner_html(placeholder, &markup)
        .map_err(|e| RenderError::InvalidOutput(e.to_string()))?;
    doc.add_class(placeholder, RENDERED_CLASS);

    if let Some(svg) = doc.find(placeholder, |doc, id| doc.is_tag(id, "svg")) {
        doc.set_attr(svg, "style", SVG_RESPONSIVE_STYLE);
        doc.remove_attr(svg, "width");
        doc.remove_attr(svg, "height");
    }
    Ok(())
}

/// Show the source view of the owning widget and an inline notice.
fn apply_render_fallback(doc: &mut Document, placeholder: NodeId) {
    if let Some(widget) = ToggleWidget::containing(doc, placeholder) {
        widget.show(doc, View::Source);
    }
    let notice = doc.create_element_with_class("div", FALLBACK_CLASS);
    doc.set_text(notice, RENDER_FALLBACK_MESSAGE);
    doc.clear_children(placeholder);
    doc.append_child(placeholder, notice);
}

/// Force every widget to its source view and disable Interactive.
///
/// Returns the number of widgets updated.
fn apply_load_fallback(doc: &mut Document) -> usize {
    let widgets = ToggleWidget::all(doc);
    for widget in &widgets {
        widget.show(doc, View::Source);
        widget.disable_interactive(doc, ENGINE_UNAVAILABLE_TITLE);
    }
    widgets.len()
}

/// Strip Google Fonts @import from SVG to avoid external requests.
#[must_use]
pub fn strip_google_fonts_import(svg: &str) -> String {
    GOOGLE_FONTS_RE.replace_all(svg, "").to_string()
}
