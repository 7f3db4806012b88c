//! Diagram block detection.
//!
//! Blocks are found in two passes. The explicit pass picks up code tagged as
//! Mermaid (`pre code.language-mermaid`, `pre code[data-lang=mermaid]`). The
//! heuristic pass looks at every remaining `<pre>` and checks whether its text
//! starts a line with a Mermaid diagram keyword.

use std::collections::HashSet;
use std::sync::LazyLock;

use prismatic_dom::{Document, NodeId};
use regex::Regex;

use crate::consts::{PROCESSED_ATTR, WRAPPER_CLASS};

/// Line-anchored Mermaid diagram declarations.
static MERMAID_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?:graph\s+(?:TB|BT|RL|LR|TD)|flowchart\s+(?:TB|BT|RL|LR|TD)|sequenceDiagram|classDiagram|stateDiagram|erDiagram|journey|gantt|pie|gitGraph|mindmap|timeline|quadrantChart|sankey|xychart)",
    )
    .unwrap()
});

const MERMAID_CLASS: &str = "language-mermaid";
const MERMAID_LANG: &str = "mermaid";

/// Whether the text looks like Mermaid source.
#[must_use]
pub fn is_diagram_source(text: &str) -> bool {
    MERMAID_SYNTAX.is_match(text.trim())
}

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Tagged as Mermaid by class or `data-lang`.
    Explicit,
    /// Untagged `<pre>` whose text matches Mermaid syntax.
    Heuristic,
}

/// A `<pre>` block to be turned into a diagram widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramCandidate {
    pub pre: NodeId,
    /// Trimmed diagram source.
    pub source: String,
    pub detection: Detection,
}

/// Find unprocessed diagram blocks in document order, explicit ones first.
#[must_use]
pub fn find_candidates(doc: &Document) -> Vec<DiagramCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let tagged = doc.select(doc.root(), |doc, id| doc.is_tag(id, "code") && is_mermaid_code(doc, id));
    for code in tagged {
        let Some(pre) = doc
            .parent(code)
            .and_then(|parent| doc.closest(parent, |doc, id| doc.is_tag(id, "pre")))
        else {
            continue;
        };
        if !is_eligible(doc, pre) || seen.contains(&pre) {
            continue;
        }
        let text = doc.text_content(code);
        let source = text.trim();
        if source.is_empty() {
            continue;
        }
        seen.insert(pre);
        candidates.push(DiagramCandidate {
            pre,
            source: source.to_owned(),
            detection: Detection::Explicit,
        });
    }

    for pre in doc.elements_by_tag(doc.root(), "pre") {
        if seen.contains(&pre) || !is_eligible(doc, pre) {
            continue;
        }
        let text = doc.text_content(pre);
        if !is_diagram_source(&text) {
            continue;
        }
        seen.insert(pre);
        candidates.push(DiagramCandidate {
            pre,
            source: text.trim().to_owned(),
            detection: Detection::Heuristic,
        });
    }

    candidates
}

fn is_mermaid_code(doc: &Document, code: NodeId) -> bool {
    doc.has_class(code, MERMAID_CLASS)
        || doc
            .attr(code, "data-lang")
            .is_some_and(|lang| lang.eq_ignore_ascii_case(MERMAID_LANG))
}

/// Not yet processed and not part of an existing widget.
fn is_eligible(doc: &Document, pre: NodeId) -> bool {
    !doc.has_attr(pre, PROCESSED_ATTR)
        && doc
            .closest(pre, |doc, id| doc.has_class(id, WRAPPER_CLASS))
            .is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heuristic_patterns_detected() {
        let sources = [
            "graph TD\nA-->B",
            "graph LR\n  A --> B",
            "flowchart TB\n  a --> b",
            "sequenceDiagram\n  Alice->>Bob: Hi",
            "classDiagram\n  Animal <|-- Duck",
            "stateDiagram-v2\n  [*] --> Still",
            "erDiagram\n  CUSTOMER ||--o{ ORDER : places",
            "journey\n  title My day",
            "gantt\n  title Plan",
            "pie title Pets\n  \"Dogs\" : 386",
            "gitGraph\n  commit",
            "mindmap\n  root((mindmap))",
            "timeline\n  title History",
            "quadrantChart\n  title Reach",
            "sankey-beta\n  a,b,10",
            "xychart-beta\n  title Sales",
            "%% comment first\ngraph BT\n  A-->B",
            "   \n\ngraph RL\nA-->B\n  ",
        ];
        for source in sources {
            assert!(is_diagram_source(source), "expected diagram: {source:?}");
        }
    }

    #[test]
    fn test_non_diagram_text_not_detected() {
        let sources = [
            "",
            "fn main() {}",
            "graph",
            "graph XY\nA-->B",
            "  let g = graph TD;",
            "# flowchart LR in a comment? no: starts with #",
            "echo sequenceDiagram",
        ];
        for source in sources {
            assert!(!is_diagram_source(source), "unexpected diagram: {source:?}");
        }
    }

    #[test]
    fn test_explicit_and_heuristic_candidates() {
        let doc = Document::parse(
            r#"<pre><code class="language-mermaid">sequenceDiagram
A->>B: hi</code></pre><pre><code data-lang="Mermaid">pie
"a": 1</code></pre><pre>graph TD
A-->B</pre><pre><code data-lang="rust">fn main() {}</code></pre>"#,
        )
        .unwrap();
        let candidates = find_candidates(&doc);
        let summary: Vec<_> = candidates
            .iter()
            .map(|c| (c.detection, c.source.lines().next().unwrap_or_default()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Detection::Explicit, "sequenceDiagram"),
                (Detection::Explicit, "pie"),
                (Detection::Heuristic, "graph TD"),
            ]
        );
    }

    #[test]
    fn test_uppercase_markup_detected() {
        let doc = Document::parse(
            r#"<PRE>graph TD
A-->B</PRE><PRE><CODE CLASS="language-mermaid">pie
"a": 1</CODE></PRE>"#,
        )
        .unwrap();
        let detections: Vec<_> = find_candidates(&doc).iter().map(|c| c.detection).collect();
        assert_eq!(detections, vec![Detection::Explicit, Detection::Heuristic]);
    }

    #[test]
    fn test_explicit_block_not_repeated_by_heuristic() {
        let doc =
            Document::parse(r#"<pre><code class="language-mermaid">graph TD\nA-->B</code></pre>"#)
                .unwrap();
        assert_eq!(find_candidates(&doc).len(), 1);
    }

    #[test]
    fn test_empty_explicit_block_skipped() {
        let doc = Document::parse(r#"<pre><code class="language-mermaid">   </code></pre>"#).unwrap();
        assert!(find_candidates(&doc).is_empty());
    }

    #[test]
    fn test_processed_and_wrapped_blocks_skipped() {
        let doc = Document::parse(
            r#"<pre data-diagram-processed="true">graph TD
A-->B</pre><div class="diagram-toggle-wrapper"><div class="diagram-view diagram-source"><pre>graph TD
A-->B</pre></div></div>"#,
        )
        .unwrap();
        assert!(find_candidates(&doc).is_empty());
    }
}
