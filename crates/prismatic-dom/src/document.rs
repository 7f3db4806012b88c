//! Arena-backed HTML document tree.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Detached nodes
//! stay in the arena until the document is dropped, so ids are never reused.

use crate::error::DomError;
use crate::parser::HtmlParser;
use crate::serializer::HtmlSerializer;

/// Tag name of the synthetic root node.
const ROOT_TAG: &str = "#document";

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element data: tag name and ordered attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name; lowercase for HTML, source case inside SVG.
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
}

impl Element {
    /// Create an element with no attributes.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// HTML document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element(Element::new(ROOT_TAG)),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            doctype: None,
        }
    }

    /// Parse an HTML document or fragment.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        let mut doc = Self::new();
        let root = doc.root;
        HtmlParser::new().parse_into(&mut doc, root, html)?;
        Ok(doc)
    }

    /// Serialize the whole document back to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        HtmlSerializer::new().document(self)
    }

    /// Serialize a node including its own tag.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        HtmlSerializer::new().outer(self, id)
    }

    /// Serialize the children of a node.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        HtmlSerializer::new().inner(self, id)
    }

    /// Synthetic root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub(crate) fn set_doctype(&mut self, doctype: String) {
        self.doctype = Some(doctype);
    }

    /// Node payload.
    #[must_use]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// Element data, if the node is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Tag name, if the node is an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Whether the node is an element with the given tag.
    #[must_use]
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    /// Parent node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Child nodes in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether the node is still reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // Attributes

    /// Get an attribute value.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Whether the element has the attribute.
    #[must_use]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let value = value.into();
        if let Some(slot) = element.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value;
        } else {
            element.attrs.push((name.to_owned(), value));
        }
    }

    /// Remove an attribute. Missing attributes are ignored.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.retain(|(key, _)| key != name);
        }
    }

    // Classes

    /// Iterate over the element's classes.
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// Whether the element carries the class.
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    /// Add a class. Adding a class twice is a no-op.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.element(id).is_none() || self.has_class(id, class) {
            return;
        }
        let mut value = self.attr(id, "class").unwrap_or_default().trim().to_owned();
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(class);
        self.set_attr(id, "class", value);
    }

    /// Remove a class. Missing classes are ignored.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let value = self
            .classes(id)
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", value);
    }

    // Traversal

    /// All descendants in document order, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Descendant elements matching a predicate, in document order.
    pub fn select(&self, scope: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.element(id).is_some() && pred(self, id))
            .collect()
    }

    /// Descendant elements with the given tag.
    #[must_use]
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.select(scope, |doc, id| doc.is_tag(id, tag))
    }

    /// Descendant elements carrying the given class.
    #[must_use]
    pub fn elements_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.select(scope, |doc, id| doc.has_class(id, class))
    }

    /// First descendant element matching a predicate.
    pub fn find(&self, scope: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.select(scope, pred).into_iter().next()
    }

    /// Nearest element, starting at `id` itself and walking up, matching a predicate.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if node != self.root && self.element(node).is_some() && pred(self, node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Concatenated text of the node and all descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(text) = self.data(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    // Construction and mutation

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    /// Create a detached element with a class attribute.
    pub fn create_element_with_class(&mut self, tag: &str, class: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag).with_attr("class", class)))
    }

    pub(crate) fn create_from_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub(crate) fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    /// Detach a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Append text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeData::Text(existing) = &mut self.nodes[last.0].data
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(text);
        self.append_child(parent, node);
    }

    /// Replace `old` with `new` at the same position. `old` becomes detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        self.detach(new);
        let children = &mut self.nodes[parent.0].children;
        if let Some(slot) = children.iter_mut().find(|child| **child == old) {
            *slot = new;
        }
        self.nodes[old.0].parent = None;
        self.nodes[new.0].parent = Some(parent);
    }

    /// Detach all children of a node.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// Parse `html` and append the resulting nodes to `parent`.
    ///
    /// Returns the top-level nodes that were inserted. Nothing is inserted if
    /// `html` fails to parse.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        let scratch = Self::parse_fragment(html)?;
        let added: Vec<NodeId> = scratch
            .children(scratch.root())
            .iter()
            .map(|&child| self.import(&scratch, child))
            .collect();
        for &node in &added {
            self.append_child(parent, node);
        }
        Ok(added)
    }

    /// Replace the children of `id` with parsed `html`.
    ///
    /// The existing children are kept if `html` fails to parse.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), DomError> {
        let scratch = Self::parse_fragment(html)?;
        self.clear_children(id);
        for &child in scratch.children(scratch.root()) {
            let imported = self.import(&scratch, child);
            self.append_child(id, imported);
        }
        Ok(())
    }

    /// Parse `html` into a detached document so a failure leaves `self` alone.
    fn parse_fragment(html: &str) -> Result<Self, DomError> {
        let mut scratch = Self::new();
        let root = scratch.root();
        HtmlParser::new().parse_into(&mut scratch, root, html)?;
        Ok(scratch)
    }

    /// Copy a subtree from another document into this one, detached.
    fn import(&mut self, other: &Self, id: NodeId) -> NodeId {
        let copy = self.push(other.data(id).clone());
        for &child in other.children(id) {
            let imported = self.import(other, child);
            self.append_child(copy, imported);
        }
        copy
    }

    /// Deep-copy a subtree. The copy is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.push(self.nodes[id.0].data.clone());
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let cloned = self.deep_clone(child);
            self.append_child(copy, cloned);
        }
        copy
    }

    /// The `<html>` element, if the document has one.
    #[must_use]
    pub fn html_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&id| self.is_tag(id, "html"))
    }

    /// The `<body>` element, falling back to the root for fragments.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.html_element()
            .and_then(|html| {
                self.children(html)
                    .iter()
                    .copied()
                    .find(|&id| self.is_tag(id, "body"))
            })
            .unwrap_or(self.root)
    }
}
