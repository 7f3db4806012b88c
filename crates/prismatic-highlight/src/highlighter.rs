//! Syntax highlighter seam.

use prismatic_dom::Document;

/// Highlights code blocks once their `language-*` classes are in place.
///
/// Implementations typically tokenize every `code[class*=language-]` element
/// and rewrite its children. A pipeline without a highlighter simply skips
/// this step.
pub trait Highlighter: Send + Sync {
    /// Highlight every eligible code block in the document.
    fn highlight_all(&self, doc: &mut Document);
}

impl<F> Highlighter for F
where
    F: Fn(&mut Document) + Send + Sync,
{
    fn highlight_all(&self, doc: &mut Document) {
        self(doc);
    }
}
