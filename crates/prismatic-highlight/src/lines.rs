//! Line highlighting for Prismatic code blocks.
//!
//! Prismatic blocks opt in through two JSON attributes on the container:
//! `data-features='["highlight_lines"]'` and `data-highlight-lines='[2, 4]'`.

use std::collections::HashSet;

use prismatic_dom::{Document, NodeId};
use serde_json::Value;

/// Feature flag enabling line highlighting.
pub const HIGHLIGHT_LINES_FEATURE: &str = "highlight_lines";

/// Class of the span wrapping a highlighted line.
pub const LINE_HIGHLIGHT_CLASS: &str = "prismatic-line-highlight";

/// Marker set on containers whose lines were already wrapped.
pub const LINES_HIGHLIGHTED_ATTR: &str = "data-lines-highlighted";

/// Parse a `data-features` value.
///
/// Malformed JSON is logged and yields no features. Non-string entries are ignored.
pub(crate) fn parse_features(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Failed to parse code block features");
            Vec::new()
        }
    }
}

/// Parse a `data-highlight-lines` value into 1-based line numbers.
///
/// Malformed JSON is logged and yields no lines. Non-integer entries are ignored.
pub(crate) fn parse_highlight_lines(raw: Option<&str>) -> Vec<usize> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|n| usize::try_from(n).ok())
            .filter(|&n| n > 0)
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Failed to parse highlight lines");
            Vec::new()
        }
    }
}

/// Rewrite the text of `code` so each listed line sits in its own span.
///
/// Existing markup inside `code` is flattened to text.
pub(crate) fn highlight_lines(doc: &mut Document, code: NodeId, lines: &[usize]) {
    let wanted: HashSet<usize> = lines.iter().copied().collect();
    let text = doc.text_content(code);
    doc.clear_children(code);

    let mut first = true;
    for (index, line) in text.split('\n').enumerate() {
        if !first {
            doc.append_text(code, "\n");
        }
        first = false;

        if wanted.contains(&(index + 1)) {
            let span = doc.create_element_with_class("span", LINE_HIGHLIGHT_CLASS);
            doc.set_text(span, line);
            doc.append_child(code, span);
        } else if !line.is_empty() {
            doc.append_text(code, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_features() {
        assert_eq!(
            parse_features(Some(r#"["copy", "highlight_lines", 3]"#)),
            vec!["copy".to_owned(), "highlight_lines".to_owned()]
        );
        assert!(parse_features(None).is_empty());
        assert!(parse_features(Some("{not json")).is_empty());
        assert!(parse_features(Some(r#"{"a": 1}"#)).is_empty());
    }

    #[test]
    fn test_parse_highlight_lines() {
        assert_eq!(parse_highlight_lines(Some("[1, 3, 2.5, -1, 0]")), vec![1, 3]);
        assert!(parse_highlight_lines(Some("[oops")).is_empty());
        assert!(parse_highlight_lines(Some("")).is_empty());
    }

    #[test]
    fn test_highlight_lines_wraps_listed_lines() {
        let mut doc = Document::parse("<code>a\nb\nc</code>").unwrap();
        let code = doc.elements_by_tag(doc.root(), "code")[0];
        highlight_lines(&mut doc, code, &[2]);
        assert_eq!(
            doc.to_html(),
            r#"<code>a
<span class="prismatic-line-highlight">b</span>
c</code>"#
        );
        assert_eq!(doc.text_content(code), "a\nb\nc");
    }

    #[test]
    fn test_highlight_lines_out_of_range_ignored() {
        let mut doc = Document::parse("<code>only</code>").unwrap();
        let code = doc.elements_by_tag(doc.root(), "code")[0];
        highlight_lines(&mut doc, code, &[5]);
        assert_eq!(doc.to_html(), "<code>only</code>");
    }
}
