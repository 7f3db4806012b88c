//! Diagram identity and lifecycle.

use std::fmt;

/// Page-unique diagram identifier, rendered as `diagram-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagramId(pub u64);

impl DiagramId {
    /// Parse a `diagram-N` attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix("diagram-")?.parse().ok().map(Self)
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagram-{}", self.0)
    }
}

/// Render lifecycle of a wrapped diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Wrapped, render not finished.
    Pending,
    /// Engine output is in the interactive view.
    Rendered,
    /// Render failed; the widget shows the source view.
    Failed,
}

/// A diagram found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramDescriptor {
    pub id: DiagramId,
    /// Trimmed diagram source.
    pub source: String,
    pub state: RenderState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagram_id_display_and_parse() {
        let id = DiagramId(7);
        assert_eq!(id.to_string(), "diagram-7");
        assert_eq!(DiagramId::parse("diagram-7"), Some(id));
        assert_eq!(DiagramId::parse("mermaid-7"), None);
        assert_eq!(DiagramId::parse("diagram-x"), None);
    }
}
