//! Diagram-definition detection.

/// Leading keywords that identify Mermaid diagram source.
pub const DIAGRAM_KEYWORDS: &[&str] = &[
    "graph",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
    "gantt",
    "pie",
    "gitGraph",
    "journey",
    "mindmap",
    "timeline",
];

/// Keyword that `text` starts with, if it is a diagram definition.
///
/// Matching is case-sensitive and anchored at the first character, so callers
/// trim the text first. It is a prefix test: `stateDiagram-v2` matches
/// `stateDiagram`.
#[must_use]
pub fn diagram_keyword(text: &str) -> Option<&'static str> {
    DIAGRAM_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| text.starts_with(keyword))
}

/// Whether `text` is a diagram definition.
#[must_use]
pub fn is_diagram_definition(text: &str) -> bool {
    diagram_keyword(text).is_some()
}
