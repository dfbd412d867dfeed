//! Candidate diagram blocks.
//!
//! Diagram source reaches the post body in three shapes depending on how it
//! was authored. Each shape has its own scan, and every scan yields the same
//! [`Candidate`]: the joined source text plus the nodes that hold it.

use crate::consts::{CODE_LINE_CLASS, DIAGRAM_ERROR_CLASS};
use crate::grammar::is_diagram_definition;
use crate::tree::{Element, NodePath};

/// Shape of a candidate block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateShape {
    /// A single `<pre>` element anywhere in the content.
    Preformatted,
    /// A run of sibling elements carrying the code-line marker class.
    CodeLineRun,
    /// A run of top-level paragraphs starting with a diagram keyword.
    ParagraphRun,
}

impl CandidateShape {
    /// Scan order. Later scans see the result of earlier replacements.
    pub const PASS_ORDER: [Self; 3] = [Self::Preformatted, Self::CodeLineRun, Self::ParagraphRun];

    /// Find all candidates of this shape, in document order.
    #[must_use]
    pub fn scan(self, root: &Element) -> Vec<Candidate> {
        let mut found = Vec::new();
        match self {
            Self::Preformatted => scan_preformatted(root, &mut Vec::new(), &mut found),
            Self::CodeLineRun => scan_code_lines(root, &mut Vec::new(), &mut found),
            Self::ParagraphRun => scan_paragraphs(root, &mut found),
        }
        found
    }

    /// Short name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preformatted => "preformatted",
            Self::CodeLineRun => "code-lines",
            Self::ParagraphRun => "paragraphs",
        }
    }
}

/// A block whose text is a diagram definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// How the block was authored.
    pub shape: CandidateShape,
    /// Diagram source: member text joined with newlines and trimmed.
    pub text: String,
    /// Path of the parent element holding the members.
    pub parent: NodePath,
    /// Child indices of the member elements, ascending.
    pub members: Vec<usize>,
}

impl Candidate {
    /// Index of the first member, where the replacement goes.
    #[must_use]
    pub fn first(&self) -> usize {
        self.members.first().copied().unwrap_or_default()
    }
}

/// Blocks that already failed stay as they are.
fn is_flagged(el: &Element) -> bool {
    el.has_class(DIAGRAM_ERROR_CLASS)
}

fn scan_preformatted(parent: &Element, path: &mut NodePath, found: &mut Vec<Candidate>) {
    for (index, child) in parent.child_elements() {
        if child.is("pre") && !is_flagged(child) {
            let text = child.text_content();
            let text = text.trim();
            if is_diagram_definition(text) {
                found.push(Candidate {
                    shape: CandidateShape::Preformatted,
                    text: text.to_owned(),
                    parent: path.clone(),
                    members: vec![index],
                });
                continue;
            }
        }
        path.push(index);
        scan_preformatted(child, path, found);
        path.pop();
    }
}

fn scan_code_lines(parent: &Element, path: &mut NodePath, found: &mut Vec<Candidate>) {
    // Indices consumed by a run, so iteration skips them
    let mut visited: Vec<usize> = Vec::new();

    for (index, child) in parent.child_elements() {
        if visited.contains(&index) {
            continue;
        }

        if child.has_class(CODE_LINE_CLASS) {
            let mut members = vec![index];
            let mut current = index;
            while let Some(next) = parent.next_element_index(current) {
                let is_line = parent.children[next]
                    .as_element()
                    .is_some_and(|el| el.has_class(CODE_LINE_CLASS));
                if !is_line {
                    break;
                }
                members.push(next);
                current = next;
            }
            visited.extend(&members);

            let flagged = members.iter().any(|&i| {
                parent.children[i].as_element().is_some_and(is_flagged)
            });
            let text = members
                .iter()
                .map(|&i| parent.children[i].text_content())
                .collect::<Vec<_>>()
                .join("\n");
            let text = text.trim();

            if !flagged && is_diagram_definition(text) {
                found.push(Candidate {
                    shape: CandidateShape::CodeLineRun,
                    text: text.to_owned(),
                    parent: path.clone(),
                    members,
                });
                continue;
            }

            for &member in &members {
                if let Some(el) = parent.children[member].as_element() {
                    path.push(member);
                    scan_code_lines(el, path, found);
                    path.pop();
                }
            }
            continue;
        }

        path.push(index);
        scan_code_lines(child, path, found);
        path.pop();
    }
}

fn scan_paragraphs(root: &Element, found: &mut Vec<Candidate>) {
    let elements: Vec<(usize, &Element)> = root.child_elements().collect();

    let mut i = 0;
    while i < elements.len() {
        let (index, node) = elements[i];
        i += 1;

        if !node.is("p") || is_flagged(node) {
            continue;
        }
        let first_line = node.text_content();
        let first_line = first_line.trim();
        if !is_diagram_definition(first_line) {
            continue;
        }

        let mut members = vec![index];
        let mut lines = vec![first_line.to_owned()];

        let mut j = i;
        while j < elements.len() {
            let (next_index, next) = elements[j];
            if !next.is("p") {
                break;
            }
            let text = next.text_content();
            members.push(next_index);
            j += 1;
            if text.trim().is_empty() {
                break;
            }
            lines.push(text);
        }

        found.push(Candidate {
            shape: CandidateShape::ParagraphRun,
            text: lines.join("\n").trim().to_owned(),
            parent: Vec::new(),
            members,
        });
        i = j;
    }
}
