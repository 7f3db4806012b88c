//! Code block normalization pass.
//!
//! Three block formats are recognized:
//! - generator output, `<pre><code data-lang="sh">`: gets `language-*` classes
//! - highlighter output, `<pre><code class="language-rust">`: gets `data-normalized-lang`
//! - Prismatic components, `.prismatic-code-block`: get theme classes and line highlighting

use prismatic_dom::{Document, NodeId};

use crate::highlighter::Highlighter;
use crate::language::{LANGUAGE_CLASS_PREFIX, LanguageAliases, language_from_classes};
use crate::lines::{
    HIGHLIGHT_LINES_FEATURE, LINES_HIGHLIGHTED_ATTR, highlight_lines, parse_features,
    parse_highlight_lines,
};

/// Theme applied to Prismatic blocks without `data-theme`.
pub const DEFAULT_THEME: &str = "github-dark";

/// Container class of Prismatic code components.
pub const PRISMATIC_BLOCK_CLASS: &str = "prismatic-code-block";

const THEME_CLASS_PREFIX: &str = "prismatic-theme-";

/// Counts from one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// `code[data-lang]` blocks that received language classes.
    pub tagged: usize,
    /// Pre-classed blocks that received `data-normalized-lang`.
    pub classed: usize,
    /// Prismatic containers that received a theme class.
    pub themed: usize,
    /// Prismatic containers whose lines were wrapped in this pass.
    pub lines_highlighted: usize,
    /// Whether a highlighter ran.
    pub highlighted: bool,
}

/// Language information for one code block, as reported by [`CodeBlockNormalizer::describe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockInfo {
    /// Raw `data-lang` value, if the block carries one.
    pub raw: Option<String>,
    /// Canonical highlighter language.
    pub canonical: String,
    /// Number of lines in the block.
    pub lines: usize,
}

/// Adds highlighter classes to code blocks and runs the highlighter.
pub struct CodeBlockNormalizer {
    aliases: LanguageAliases,
    default_theme: String,
    highlighter: Option<Box<dyn Highlighter>>,
}

impl Default for CodeBlockNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeBlockNormalizer {
    /// Normalizer with built-in aliases, the default theme and no highlighter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            aliases: LanguageAliases::new(),
            default_theme: DEFAULT_THEME.to_owned(),
            highlighter: None,
        }
    }

    /// Use a custom alias table.
    #[must_use]
    pub fn with_aliases(mut self, aliases: LanguageAliases) -> Self {
        self.aliases = aliases;
        self
    }

    /// Theme for Prismatic blocks without `data-theme`.
    #[must_use]
    pub fn with_default_theme(mut self, theme: impl Into<String>) -> Self {
        self.default_theme = theme.into();
        self
    }

    /// Run `highlighter` after classes are in place.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    /// Normalize every code block in the document.
    ///
    /// Safe to run repeatedly: classes are only added once and Prismatic
    /// blocks are marked after their lines are wrapped.
    pub fn apply(&self, doc: &mut Document) -> NormalizeReport {
        let mut report = NormalizeReport::default();

        for code in tagged_blocks(doc) {
            let Some(raw) = doc.attr(code, "data-lang").map(str::to_owned) else {
                continue;
            };
            let canonical = self.aliases.normalize(&raw);
            let class = format!("{LANGUAGE_CLASS_PREFIX}{canonical}");
            doc.add_class(code, &class);

            if let Some(pre) = doc.parent(code) {
                doc.add_class(pre, &class);
                doc.set_attr(pre, "data-lang", raw.as_str());
                doc.set_attr(pre, "data-normalized-lang", canonical.as_str());
            }
            tracing::debug!(raw = %raw, canonical = %canonical, "Normalized code block language");
            report.tagged += 1;
        }

        for code in classed_blocks(doc) {
            let Some(lang) = language_from_classes(doc.classes(code)).map(str::to_owned) else {
                continue;
            };
            if let Some(pre) = doc.parent(code) {
                doc.set_attr(pre, "data-normalized-lang", lang);
                report.classed += 1;
            }
        }

        for container in doc.elements_by_class(doc.root(), PRISMATIC_BLOCK_CLASS) {
            let Some(highlighted) = self.process_prismatic_block(doc, container) else {
                continue;
            };
            if highlighted {
                report.lines_highlighted += 1;
            }
            report.themed += 1;
        }

        if let Some(highlighter) = &self.highlighter {
            highlighter.highlight_all(doc);
            report.highlighted = true;
        }

        tracing::debug!(
            tagged = report.tagged,
            classed = report.classed,
            themed = report.themed,
            "Code blocks normalized"
        );
        report
    }

    /// Describe every recognized code block without mutating the document.
    #[must_use]
    pub fn describe(&self, doc: &Document) -> Vec<CodeBlockInfo> {
        doc.select(doc.root(), |doc, id| {
            doc.is_tag(id, "code") && doc.parent(id).is_some_and(|p| doc.is_tag(p, "pre"))
        })
        .into_iter()
        .filter_map(|code| {
            let raw = doc.attr(code, "data-lang").filter(|s| !s.is_empty());
            let canonical = match raw {
                Some(raw) => self.aliases.normalize(raw),
                None => language_from_classes(doc.classes(code))?.to_owned(),
            };
            Some(CodeBlockInfo {
                raw: raw.map(str::to_owned),
                canonical,
                lines: doc.text_content(code).lines().count(),
            })
        })
        .collect()
    }

    /// Apply theme and line highlighting. Returns whether lines were wrapped,
    /// or `None` for a container without a `<code>` element, which is left
    /// untouched.
    fn process_prismatic_block(&self, doc: &mut Document, container: NodeId) -> Option<bool> {
        let code = doc.find(container, |doc, id| doc.is_tag(id, "code"))?;
        let theme = doc
            .attr(container, "data-theme")
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.default_theme)
            .to_owned();
        doc.add_class(container, &format!("{THEME_CLASS_PREFIX}{theme}"));

        if doc.has_attr(container, LINES_HIGHLIGHTED_ATTR) {
            return Some(false);
        }
        let features = parse_features(doc.attr(container, "data-features"));
        let lines = parse_highlight_lines(doc.attr(container, "data-highlight-lines"));
        if lines.is_empty() || !features.iter().any(|f| f == HIGHLIGHT_LINES_FEATURE) {
            return Some(false);
        }

        highlight_lines(doc, code, &lines);
        doc.set_attr(container, LINES_HIGHLIGHTED_ATTR, "true");
        Some(true)
    }
}

/// Switch every Prismatic block to `theme`.
///
/// Returns the number of blocks updated.
pub fn set_theme(doc: &mut Document, theme: &str) -> usize {
    let blocks = doc.elements_by_class(doc.root(), PRISMATIC_BLOCK_CLASS);
    for &block in &blocks {
        let stale: Vec<String> = doc
            .classes(block)
            .filter(|class| class.starts_with(THEME_CLASS_PREFIX))
            .map(str::to_owned)
            .collect();
        for class in stale {
            doc.remove_class(block, &class);
        }
        doc.add_class(block, &format!("{THEME_CLASS_PREFIX}{theme}"));
        doc.set_attr(block, "data-theme", theme);
    }
    tracing::info!(theme, blocks = blocks.len(), "Code block theme changed");
    blocks.len()
}

/// `pre > code[data-lang]` with a non-empty value.
fn tagged_blocks(doc: &Document) -> Vec<NodeId> {
    doc.select(doc.root(), |doc, id| {
        doc.is_tag(id, "code")
            && doc.attr(id, "data-lang").is_some_and(|lang| !lang.is_empty())
            && doc.parent(id).is_some_and(|p| doc.is_tag(p, "pre"))
    })
}

/// `pre > code.language-*` without `data-lang`.
fn classed_blocks(doc: &Document) -> Vec<NodeId> {
    doc.select(doc.root(), |doc, id| {
        doc.is_tag(id, "code")
            && !doc.has_attr(id, "data-lang")
            && language_from_classes(doc.classes(id)).is_some()
            && doc.parent(id).is_some_and(|p| doc.is_tag(p, "pre"))
    })
}
