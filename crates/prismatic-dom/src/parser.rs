//! Lenient HTML parser built on the quick-xml reader.
//!
//! HTML is not XML, so the reader runs with end-name checks disabled and the
//! input is massaged first: named entities are converted, bare `&` and `<`
//! escaped, and `<script>`/`<style>` bodies wrapped in CDATA. HTML names are
//! lowercased outside SVG. Void elements never take children, list items and
//! paragraphs close their open siblings, and unmatched end tags are dropped.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;

use crate::document::{Document, Element, NodeId};
use crate::entities::{decode_reference, prepare_entities};
use crate::error::DomError;

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

static SCRIPT_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<script\b[^>]*>)(.*?)(</script\s*>)").unwrap());

static STYLE_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<style\b[^>]*>)(.*?)(</style\s*>)").unwrap());

/// Whether the tag is an HTML void element.
#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub(crate) struct HtmlParser;

impl HtmlParser {
    pub(crate) fn new() -> Self {
        Self
    }

    /// Parse `html` and append the resulting nodes under `parent`.
    pub(crate) fn parse_into(
        &self,
        doc: &mut Document,
        parent: NodeId,
        html: &str,
    ) -> Result<(), DomError> {
        let prepared = prepare_input(html);

        let mut reader = Reader::from_str(&prepared);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        // Open elements; index 0 is the insertion parent and is never popped.
        let mut stack = vec![parent];

        loop {
            let current = stack.last().copied().unwrap_or(parent);
            match reader.read_event()? {
                Event::Start(e) => {
                    let element = self.decode_element(&reader, &e, in_svg(doc, &stack));
                    close_implied(doc, &mut stack, &element.tag);
                    let insert_at = stack.last().copied().unwrap_or(parent);
                    let void = is_void_element(&element.tag);
                    let node = doc.create_from_element(element);
                    doc.append_child(insert_at, node);
                    if !void {
                        stack.push(node);
                    }
                }
                Event::Empty(e) => {
                    let element = self.decode_element(&reader, &e, in_svg(doc, &stack));
                    close_implied(doc, &mut stack, &element.tag);
                    let insert_at = stack.last().copied().unwrap_or(parent);
                    let node = doc.create_from_element(element);
                    doc.append_child(insert_at, node);
                }
                Event::End(e) => {
                    let tag = self.decode_name(&reader, e.name().as_ref());
                    if let Some(pos) = stack[1..].iter().rposition(|&id| {
                        doc.tag(id).is_some_and(|open| open.eq_ignore_ascii_case(&tag))
                    }) {
                        stack.truncate(pos + 1);
                    }
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?;
                    doc.append_text(current, &text);
                }
                Event::GeneralRef(e) => {
                    let name = reader.decoder().decode(&e)?;
                    doc.append_text(current, &decode_reference(&name));
                }
                Event::CData(e) => {
                    doc.append_text(current, &String::from_utf8_lossy(&e));
                }
                Event::Comment(e) => {
                    let text = reader.decoder().decode(&e)?;
                    let node = doc.create_comment(text);
                    doc.append_child(current, node);
                }
                Event::DocType(e) => {
                    if parent == doc.root() {
                        let text = reader.decoder().decode(&e)?;
                        doc.set_doctype(text.trim().to_owned());
                    }
                }
                Event::Decl(_) | Event::PI(_) => {}
                Event::Eof => break,
            }
        }

        Ok(())
    }

    /// Decode a start tag. HTML names are lowercased; SVG content and the
    /// attributes of `<svg>` itself keep their case (`viewBox`).
    fn decode_element(&self, reader: &Reader<&[u8]>, e: &BytesStart, foreign: bool) -> Element {
        let mut tag = self.decode_name(reader, e.name().as_ref());
        if !foreign {
            tag.make_ascii_lowercase();
        }
        let lowercase_attrs = !foreign && tag != "svg";
        let mut element = Element::new(tag);
        for attr in e.html_attributes().flatten() {
            let mut key = self.decode_name(reader, attr.key.as_ref());
            if lowercase_attrs {
                key.make_ascii_lowercase();
            }
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                Cow::into_owned,
            );
            element.attrs.push((key, value));
        }
        element
    }

    fn decode_name(&self, reader: &Reader<&[u8]>, name: &[u8]) -> String {
        reader
            .decoder()
            .decode(name)
            .map_or_else(|_| String::from_utf8_lossy(name).into_owned(), Cow::into_owned)
    }
}

/// Whether new elements land inside an `<svg>` subtree.
fn in_svg(doc: &Document, stack: &[NodeId]) -> bool {
    stack.iter().any(|&id| doc.tag(id) == Some("svg"))
}

/// Start tags that end an open element of the same kind, and the elements
/// that stop the search for it.
fn implied_end(tag: &str) -> Option<(&'static [&'static str], &'static [&'static str])> {
    const BLOCK_SCOPE: &[&str] = &[
        "div", "section", "article", "aside", "main", "nav", "header", "footer", "blockquote",
        "li", "dd", "td", "th", "button", "body", "html",
    ];
    match tag {
        "li" => Some((&["li"], &["ul", "ol", "menu"])),
        "dt" | "dd" => Some((&["dt", "dd"], &["dl"])),
        "p" => Some((&["p"], BLOCK_SCOPE)),
        "tr" => Some((&["tr"], &["table", "thead", "tbody", "tfoot"])),
        "td" | "th" => Some((&["td", "th"], &["tr", "table"])),
        "option" => Some((&["option"], &["select", "datalist", "optgroup"])),
        _ => None,
    }
}

/// Close an open `li`, `p`, `dt`/`dd`, `tr`, `td`/`th` or `option` before a
/// sibling of the same kind starts. The insertion parent is never closed.
fn close_implied(doc: &Document, stack: &mut Vec<NodeId>, tag: &str) {
    let Some((closes, bounds)) = implied_end(tag) else {
        return;
    };
    for pos in (1..stack.len()).rev() {
        let Some(open) = doc.tag(stack[pos]) else {
            continue;
        };
        if closes.contains(&open) {
            stack.truncate(pos);
            return;
        }
        if bounds.contains(&open) {
            return;
        }
    }
}

/// Wrap raw-text bodies, then normalize entities and bare `<` everywhere
/// outside CDATA.
fn prepare_input(html: &str) -> String {
    let wrapped = wrap_raw_text(html);
    let mut out = String::with_capacity(wrapped.len());
    let mut rest: &str = &wrapped;
    while let Some(start) = rest.find("<![CDATA[") {
        out.push_str(&prepare_entities(&escape_bare_lt(&rest[..start])));
        let section = &rest[start..];
        let end = section.find("]]>").map_or(section.len(), |i| i + 3);
        out.push_str(&section[..end]);
        rest = &section[end..];
    }
    out.push_str(&prepare_entities(&escape_bare_lt(rest)));
    out
}

/// Escape every `<` that cannot open markup, as a browser reads it.
///
/// Markup starts with a letter, `/`, `!` or `?` after the `<`. Comments are
/// copied through untouched.
fn escape_bare_lt(text: &str) -> Cow<'_, str> {
    if !text.contains('<') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("<!--") {
            let end = tail.find("-->").map_or(tail.len(), |i| i + 3);
            out.push_str(&tail[..end]);
            rest = &tail[end..];
            continue;
        }
        let opens_markup = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        out.push_str(if opens_markup { "<" } else { "&lt;" });
        rest = &tail[1..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Wrap non-empty `<script>` and `<style>` bodies in CDATA.
fn wrap_raw_text(html: &str) -> Cow<'_, str> {
    let wrap = |caps: &regex::Captures| {
        let body = &caps[2];
        if body.trim().is_empty() || body.contains("]]>") {
            caps[0].to_owned()
        } else {
            format!("{}<![CDATA[{body}]]>{}", &caps[1], &caps[3])
        }
    };
    match SCRIPT_BODY.replace_all(html, wrap) {
        Cow::Borrowed(_) => STYLE_BODY.replace_all(html, wrap),
        Cow::Owned(scripts) => Cow::Owned(STYLE_BODY.replace_all(&scripts, wrap).into_owned()),
    }
}
