//! Code block language normalization for Prismatic pages.
//!
//! Static site generators annotate code blocks with the raw fence language
//! (`<pre><code data-lang="sh">`), while syntax highlighters look for a
//! canonical `language-*` class. This crate bridges the two:
//! - [`normalize_language`] / [`LanguageAliases`]: alias table lookup
//! - [`CodeBlockNormalizer`]: document pass adding classes, themes and line highlights
//! - [`Highlighter`]: optional highlighter invoked after normalization
//!
//! # Example
//!
//! ```
//! use prismatic_dom::Document;
//! use prismatic_highlight::CodeBlockNormalizer;
//!
//! let mut doc = Document::parse(r#"<pre><code data-lang="sh">ls</code></pre>"#).unwrap();
//! let report = CodeBlockNormalizer::new().apply(&mut doc);
//! assert_eq!(report.tagged, 1);
//! assert!(doc.to_html().contains(r#"class="language-bash""#));
//! ```

mod highlighter;
mod language;
mod lines;
mod normalizer;

pub use highlighter::Highlighter;
pub use language::{LANGUAGE_CLASS_PREFIX, LanguageAliases, language_from_classes, normalize_language};
pub use lines::{HIGHLIGHT_LINES_FEATURE, LINE_HIGHLIGHT_CLASS, LINES_HIGHLIGHTED_ATTR};
pub use normalizer::{
    CodeBlockInfo, CodeBlockNormalizer, DEFAULT_THEME, NormalizeReport, PRISMATIC_BLOCK_CLASS,
    set_theme,
};
