//! Source/Interactive toggle widget.
//!
//! A widget replaces a diagram `<pre>` with:
//!
//! ```text
//! div.diagram-toggle-wrapper[data-diagram-id]
//! ├── div.diagram-toggle-bar
//! │   ├── span.diagram-toggle-label
//! │   └── div.diagram-toggle-buttons
//! │       ├── button.diagram-toggle-btn[data-view=source]
//! │       └── button.diagram-toggle-btn.active[data-view=interactive]
//! ├── div.diagram-view.diagram-source.hidden    (clone of the original <pre>)
//! └── div.diagram-view.diagram-interactive
//!     └── div.mermaid[data-diagram-id]          (diagram source, later the SVG)
//! ```
//!
//! Exactly one view is visible at a time, and the active button matches it.

use std::fmt;

use prismatic_dom::{Document, NodeId};

use crate::consts::{
    ACTIVE_CLASS, DIAGRAM_ID_ATTR, HIDDEN_CLASS, INTERACTIVE_VIEW_CLASS, PLACEHOLDER_CLASS,
    PROCESSED_ATTR, SOURCE_VIEW_CLASS, TOGGLE_BAR_CLASS, TOGGLE_BUTTON_CLASS,
    TOGGLE_BUTTONS_CLASS, TOGGLE_LABEL_CLASS, VIEW_ATTR, VIEW_CLASS, WRAPPER_CLASS,
};
use crate::diagram::DiagramId;

const SOURCE_ICON_PATH: &str = "M10 20l4-16m4 4l4 4-4 4M6 16l-4-4 4-4";
const INTERACTIVE_ICON_PATH: &str = "M4 5a1 1 0 011-1h14a1 1 0 011 1v2a1 1 0 01-1 1H5a1 1 0 01-1-1V5zM4 13a1 1 0 011-1h6a1 1 0 011 1v6a1 1 0 01-1 1H5a1 1 0 01-1-1v-6zM16 13a1 1 0 011-1h2a1 1 0 011 1v6a1 1 0 01-1 1h-2a1 1 0 01-1-1v-6z";

/// One of the two widget views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Source,
    Interactive,
}

impl View {
    /// Value of the button's `data-view` attribute.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Interactive => "interactive",
        }
    }

    /// Parse a `data-view` value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "source" => Some(Self::Source),
            "interactive" => Some(Self::Interactive),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Interactive => "Interactive",
        }
    }

    fn icon_path(self) -> &'static str {
        match self {
            Self::Source => SOURCE_ICON_PATH,
            Self::Interactive => INTERACTIVE_ICON_PATH,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handles to the parts of a toggle widget in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleWidget {
    pub wrapper: NodeId,
    pub source_view: NodeId,
    pub interactive_view: NodeId,
    pub source_button: NodeId,
    pub interactive_button: NodeId,
    pub placeholder: NodeId,
}

impl ToggleWidget {
    /// Replace `pre` with a new widget showing the Interactive view.
    ///
    /// `pre` is marked processed before it is cloned into the source view, so
    /// neither the original nor the clone is picked up again.
    pub fn wrap(doc: &mut Document, pre: NodeId, source: &str, id: DiagramId) -> Self {
        let id_value = id.to_string();
        doc.set_attr(pre, PROCESSED_ATTR, "true");

        let wrapper = doc.create_element_with_class("div", WRAPPER_CLASS);
        doc.set_attr(wrapper, DIAGRAM_ID_ATTR, id_value.as_str());

        let bar = doc.create_element_with_class("div", TOGGLE_BAR_CLASS);
        let label = doc.create_element_with_class("span", TOGGLE_LABEL_CLASS);
        doc.set_text(label, "Diagram");
        let buttons = doc.create_element_with_class("div", TOGGLE_BUTTONS_CLASS);
        let source_button = create_button(doc, View::Source, false);
        let interactive_button = create_button(doc, View::Interactive, true);
        doc.append_child(buttons, source_button);
        doc.append_child(buttons, interactive_button);
        doc.append_child(bar, label);
        doc.append_child(bar, buttons);

        let source_view = doc.create_element_with_class(
            "div",
            &format!("{VIEW_CLASS} {SOURCE_VIEW_CLASS} {HIDDEN_CLASS}"),
        );
        let clone = doc.deep_clone(pre);
        doc.append_child(source_view, clone);

        let interactive_view =
            doc.create_element_with_class("div", &format!("{VIEW_CLASS} {INTERACTIVE_VIEW_CLASS}"));
        let placeholder = doc.create_element_with_class("div", PLACEHOLDER_CLASS);
        doc.set_text(placeholder, source);
        doc.set_attr(placeholder, DIAGRAM_ID_ATTR, id_value);
        doc.append_child(interactive_view, placeholder);

        doc.append_child(wrapper, bar);
        doc.append_child(wrapper, source_view);
        doc.append_child(wrapper, interactive_view);
        doc.replace(pre, wrapper);

        Self {
            wrapper,
            source_view,
            interactive_view,
            source_button,
            interactive_button,
            placeholder,
        }
    }

    /// Locate the parts of an existing widget.
    ///
    /// Returns `None` if the wrapper is missing any of its views or buttons.
    #[must_use]
    pub fn from_wrapper(doc: &Document, wrapper: NodeId) -> Option<Self> {
        let button = |view: View| {
            doc.find(wrapper, |doc, id| doc.attr(id, VIEW_ATTR) == Some(view.as_str()))
        };
        let interactive_view = doc.find(wrapper, |doc, id| doc.has_class(id, INTERACTIVE_VIEW_CLASS))?;
        Some(Self {
            wrapper,
            source_view: doc.find(wrapper, |doc, id| doc.has_class(id, SOURCE_VIEW_CLASS))?,
            interactive_view,
            source_button: button(View::Source)?,
            interactive_button: button(View::Interactive)?,
            placeholder: doc
                .find(interactive_view, |doc, id| doc.has_class(id, PLACEHOLDER_CLASS))?,
        })
    }

    /// All well-formed widgets in the document.
    #[must_use]
    pub fn all(doc: &Document) -> Vec<Self> {
        doc.elements_by_class(doc.root(), WRAPPER_CLASS)
            .into_iter()
            .filter_map(|wrapper| Self::from_wrapper(doc, wrapper))
            .collect()
    }

    /// Widget owning `node`, if any.
    #[must_use]
    pub fn containing(doc: &Document, node: NodeId) -> Option<Self> {
        let wrapper = doc.closest(node, |doc, id| doc.has_class(id, WRAPPER_CLASS))?;
        Self::from_wrapper(doc, wrapper)
    }

    /// Diagram id from the wrapper.
    #[must_use]
    pub fn id(&self, doc: &Document) -> Option<DiagramId> {
        doc.attr(self.wrapper, DIAGRAM_ID_ATTR)
            .and_then(DiagramId::parse)
    }

    /// Handle a click on the button for `view`.
    ///
    /// Clicks on a disabled button are ignored. Returns whether the view changed hands.
    pub fn select(&self, doc: &mut Document, view: View) -> bool {
        if doc.has_attr(self.button(view), "disabled") {
            tracing::debug!(view = %view, "Ignoring click on disabled toggle button");
            return false;
        }
        self.show(doc, view);
        true
    }

    /// Show `view` regardless of button state.
    pub fn show(&self, doc: &mut Document, view: View) {
        let (shown, hidden) = match view {
            View::Source => (self.source_view, self.interactive_view),
            View::Interactive => (self.interactive_view, self.source_view),
        };
        doc.remove_class(shown, HIDDEN_CLASS);
        doc.add_class(hidden, HIDDEN_CLASS);

        let other = match view {
            View::Source => View::Interactive,
            View::Interactive => View::Source,
        };
        doc.add_class(self.button(view), ACTIVE_CLASS);
        doc.remove_class(self.button(other), ACTIVE_CLASS);
    }

    /// Disable the Interactive button with an explanatory tooltip.
    pub fn disable_interactive(&self, doc: &mut Document, title: &str) {
        doc.set_attr(self.interactive_button, "disabled", "");
        doc.set_attr(self.interactive_button, "title", title);
    }

    /// Currently visible view.
    #[must_use]
    pub fn current_view(&self, doc: &Document) -> View {
        if doc.has_class(self.interactive_view, HIDDEN_CLASS) {
            View::Source
        } else {
            View::Interactive
        }
    }

    /// Whether the Interactive button is disabled.
    #[must_use]
    pub fn is_interactive_disabled(&self, doc: &Document) -> bool {
        doc.has_attr(self.interactive_button, "disabled")
    }

    fn button(&self, view: View) -> NodeId {
        match view {
            View::Source => self.source_button,
            View::Interactive => self.interactive_button,
        }
    }
}

fn create_button(doc: &mut Document, view: View, active: bool) -> NodeId {
    let class = if active {
        format!("{TOGGLE_BUTTON_CLASS} {ACTIVE_CLASS}")
    } else {
        TOGGLE_BUTTON_CLASS.to_owned()
    };
    let button = doc.create_element_with_class("button", &class);
    doc.set_attr(button, VIEW_ATTR, view.as_str());

    let icon = doc.create_element_with_class("svg", "w-3.5 h-3.5 mr-1");
    doc.set_attr(icon, "fill", "none");
    doc.set_attr(icon, "stroke", "currentColor");
    doc.set_attr(icon, "viewBox", "0 0 24 24");
    let path = doc.create_element("path");
    doc.set_attr(path, "stroke-linecap", "round");
    doc.set_attr(path, "stroke-linejoin", "round");
    doc.set_attr(path, "stroke-width", "2");
    doc.set_attr(path, "d", view.icon_path());
    doc.append_child(icon, path);

    doc.append_child(button, icon);
    doc.append_text(button, view.label());
    button
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrapped(html: &str) -> (Document, ToggleWidget) {
        let mut doc = Document::parse(html).unwrap();
        let pre = doc.elements_by_tag(doc.root(), "pre")[0];
        let source = doc.text_content(pre).trim().to_owned();
        let widget = ToggleWidget::wrap(&mut doc, pre, &source, DiagramId(1));
        (doc, widget)
    }

    fn assert_exclusive(doc: &Document, widget: &ToggleWidget) {
        let source_hidden = doc.has_class(widget.source_view, HIDDEN_CLASS);
        let interactive_hidden = doc.has_class(widget.interactive_view, HIDDEN_CLASS);
        assert_ne!(source_hidden, interactive_hidden, "exactly one view visible");
        let view = widget.current_view(doc);
        assert!(doc.has_class(widget.button(view), ACTIVE_CLASS));
        let other = if view == View::Source {
            View::Interactive
        } else {
            View::Source
        };
        assert!(!doc.has_class(widget.button(other), ACTIVE_CLASS));
    }

    #[test]
    fn test_wrap_markup() {
        let (doc, _) = wrapped("<main><pre>graph TD\nA--&gt;B</pre></main>");
        let expected = concat!(
            r#"<main><div class="diagram-toggle-wrapper" data-diagram-id="diagram-1">"#,
            r#"<div class="diagram-toggle-bar"><span class="diagram-toggle-label">Diagram</span>"#,
            r#"<div class="diagram-toggle-buttons">"#,
            r#"<button class="diagram-toggle-btn" data-view="source"><svg class="w-3.5 h-3.5 mr-1" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M10 20l4-16m4 4l4 4-4 4M6 16l-4-4 4-4" /></svg>Source</button>"#,
            r#"<button class="diagram-toggle-btn active" data-view="interactive"><svg class="w-3.5 h-3.5 mr-1" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M4 5a1 1 0 011-1h14a1 1 0 011 1v2a1 1 0 01-1 1H5a1 1 0 01-1-1V5zM4 13a1 1 0 011-1h6a1 1 0 011 1v6a1 1 0 01-1 1H5a1 1 0 01-1-1v-6zM16 13a1 1 0 011-1h2a1 1 0 011 1v6a1 1 0 01-1 1h-2a1 1 0 01-1-1v-6z" /></svg>Interactive</button>"#,
            r#"</div></div>"#,
            r#"<div class="diagram-view diagram-source hidden"><pre data-diagram-processed="true">graph TD"#,
            "\n",
            r#"A--&gt;B</pre></div>"#,
            r#"<div class="diagram-view diagram-interactive"><div class="mermaid" data-diagram-id="diagram-1">graph TD"#,
            "\n",
            r#"A--&gt;B</div></div>"#,
            r#"</div></main>"#,
        );
        assert_eq!(doc.to_html(), expected);
    }

    #[test]
    fn test_wrap_marks_original_before_clone() {
        let mut doc = Document::parse("<pre>graph TD\nA-->B</pre>").unwrap();
        let pre = doc.elements_by_tag(doc.root(), "pre")[0];
        let widget = ToggleWidget::wrap(&mut doc, pre, "graph TD\nA-->B", DiagramId(3));
        assert_eq!(doc.attr(pre, PROCESSED_ATTR), Some("true"));
        let clone = doc.children(widget.source_view)[0];
        assert_eq!(doc.attr(clone, PROCESSED_ATTR), Some("true"));
        assert!(!doc.is_attached(pre));
        assert_eq!(widget.id(&doc), Some(DiagramId(3)));
    }

    #[test]
    fn test_initial_view_is_interactive() {
        let (doc, widget) = wrapped("<pre>graph TD\nA-->B</pre>");
        assert_eq!(widget.current_view(&doc), View::Interactive);
        assert_exclusive(&doc, &widget);
    }

    #[test]
    fn test_toggle_exclusive_after_any_clicks() {
        let (mut doc, widget) = wrapped("<pre>graph TD\nA-->B</pre>");
        let clicks = [
            View::Source,
            View::Source,
            View::Interactive,
            View::Source,
            View::Interactive,
            View::Interactive,
        ];
        for view in clicks {
            assert!(widget.select(&mut doc, view));
            assert_eq!(widget.current_view(&doc), view);
            assert_exclusive(&doc, &widget);
        }
    }

    #[test]
    fn test_disabled_button_ignored() {
        let (mut doc, widget) = wrapped("<pre>graph TD\nA-->B</pre>");
        widget.select(&mut doc, View::Source);
        widget.disable_interactive(&mut doc, "unavailable");
        assert!(!widget.select(&mut doc, View::Interactive));
        assert_eq!(widget.current_view(&doc), View::Source);
        assert!(widget.is_interactive_disabled(&doc));
        assert_eq!(doc.attr(widget.interactive_button, "title"), Some("unavailable"));
        assert_exclusive(&doc, &widget);
    }

    #[test]
    fn test_from_wrapper_after_reparse() {
        let (doc, widget) = wrapped("<pre>graph TD\nA-->B</pre>");
        let reparsed = Document::parse(&doc.to_html()).unwrap();
        let found = ToggleWidget::all(&reparsed);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(&reparsed), Some(DiagramId(1)));
        assert_eq!(found[0].current_view(&reparsed), widget.current_view(&doc));
    }

    #[test]
    fn test_containing_finds_owner() {
        let (doc, widget) = wrapped("<pre>graph TD\nA-->B</pre>");
        assert_eq!(ToggleWidget::containing(&doc, widget.placeholder), Some(widget));
        assert_eq!(ToggleWidget::containing(&doc, doc.root()), None);
    }

    #[test]
    fn test_view_parse() {
        assert_eq!(View::parse("source"), Some(View::Source));
        assert_eq!(View::parse("interactive"), Some(View::Interactive));
        assert_eq!(View::parse("other"), None);
        assert_eq!(View::Interactive.to_string(), "interactive");
    }
}
