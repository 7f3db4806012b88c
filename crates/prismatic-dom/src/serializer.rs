//! HTML serializer for [`Document`] trees.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use std::fmt::Write;

use crate::document::{Document, NodeData, NodeId};
use crate::parser::is_void_element;

/// Elements whose text content is emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(crate) struct HtmlSerializer;

#[derive(Clone, Copy, Default)]
struct Context {
    /// Inside an `<svg>` subtree: empty elements self-close.
    in_svg: bool,
    /// Inside `<script>`/`<style>`: text is not escaped.
    raw_text: bool,
}

impl HtmlSerializer {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn document(&self, doc: &Document) -> String {
        let mut out = String::with_capacity(4096);
        if let Some(doctype) = doc.doctype() {
            write!(out, "<!DOCTYPE {doctype}>").unwrap();
        }
        for &child in doc.children(doc.root()) {
            self.write_node(doc, child, Context::default(), &mut out);
        }
        out
    }

    pub(crate) fn outer(&self, doc: &Document, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(doc, id, self.context_of(doc, id), &mut out);
        out
    }

    pub(crate) fn inner(&self, doc: &Document, id: NodeId) -> String {
        let mut out = String::new();
        let ctx = self.child_context(doc, id, self.context_of(doc, id));
        for &child in doc.children(id) {
            self.write_node(doc, child, ctx, &mut out);
        }
        out
    }

    /// Context inherited from the ancestors of `id`.
    fn context_of(&self, doc: &Document, id: NodeId) -> Context {
        let mut ctx = Context::default();
        let mut current = doc.parent(id);
        while let Some(node) = current {
            if doc.is_tag(node, "svg") {
                ctx.in_svg = true;
            }
            current = doc.parent(node);
        }
        ctx
    }

    fn child_context(&self, doc: &Document, id: NodeId, ctx: Context) -> Context {
        let tag = doc.tag(id).unwrap_or_default();
        Context {
            in_svg: ctx.in_svg || tag == "svg",
            raw_text: RAW_TEXT_ELEMENTS.contains(&tag),
        }
    }

    fn write_node(&self, doc: &Document, id: NodeId, ctx: Context, out: &mut String) {
        match doc.data(id) {
            NodeData::Text(text) => {
                if ctx.raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            NodeData::Comment(text) => {
                write!(out, "<!--{text}-->").unwrap();
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (key, value) in &element.attrs {
                    write!(out, r#" {key}="{}""#, escape_attr(value)).unwrap();
                }

                let child_ctx = self.child_context(doc, id, ctx);
                let children = doc.children(id);
                if is_void_element(&element.tag) && children.is_empty() {
                    out.push('>');
                } else if child_ctx.in_svg && children.is_empty() {
                    out.push_str(" />");
                } else {
                    out.push('>');
                    for &child in children {
                        self.write_node(doc, child, child_ctx, out);
                    }
                    write!(out, "</{}>", element.tag).unwrap();
                }
            }
        }
    }
}

/// Escape text content.
#[must_use]
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape an attribute value for double-quoted output.
#[must_use]
pub fn escape_attr(text: &str) -> String {
    escape(text, true)
}

fn escape(text: &str, quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_roundtrip_preserves_attribute_order() {
        let html = r#"<pre class="a" data-lang="sh"><code>echo "hi" &amp;&amp; exit</code></pre>"#;
        let doc = Document::parse(html).unwrap();
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_void_elements_not_closed() {
        let doc = Document::parse("<p>a<br/>b</p>").unwrap();
        assert_eq!(doc.to_html(), "<p>a<br>b</p>");
    }

    #[test]
    fn test_empty_html_elements_get_end_tag() {
        let doc = Document::parse(r#"<div class="mermaid"/>"#).unwrap();
        assert_eq!(doc.to_html(), r#"<div class="mermaid"></div>"#);
    }

    #[test]
    fn test_svg_children_self_close() {
        let doc = Document::parse(r#"<svg viewBox="0 0 1 1"><path d="M0 0"/></svg>"#).unwrap();
        assert_eq!(doc.to_html(), r#"<svg viewBox="0 0 1 1"><path d="M0 0" /></svg>"#);
    }

    #[test]
    fn test_script_text_not_escaped() {
        let doc = Document::parse("<script>a < b && c()</script>").unwrap();
        assert_eq!(doc.to_html(), "<script>a < b && c()</script>");
    }

    #[test]
    fn test_doctype_emitted() {
        let doc = Document::parse("<!DOCTYPE html><html><body></body></html>").unwrap();
        assert_eq!(doc.to_html(), "<!DOCTYPE html><html><body></body></html>");
    }

    #[test]
    fn test_escape_attr_quotes() {
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_text(r#"say "hi""#), r#"say "hi""#);
    }
}
