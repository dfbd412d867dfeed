//! Post body renderer.
//!
//! [`ContentRenderer`] turns sanitized post HTML into its final form:
//!
//! 1. Parse into a [`Fragment`] and run the allow-list sanitizer
//! 2. Run the three candidate scans in [`CandidateShape::PASS_ORDER`]; each
//!    candidate goes through one classify-and-replace routine
//! 3. Wrap pending images in loading placeholders
//!
//! Diagram render calls are made one at a time in document order, each with a
//! fresh id. A failed call leaves its block in place, flags every node of the
//! block with the error class and lets the pass continue.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::candidate::{Candidate, CandidateShape};
use crate::consts::{
    DEFAULT_IMAGE_MIN_HEIGHT, DIAGRAM_CLASS, DIAGRAM_ERROR_CLASS, RENDER_ID_PREFIX,
};
use crate::error::{ContentError, DiagramError};
use crate::images::{ImageEvent, PlaceholderSet, wrap_images};
use crate::parser::parse_fragment;
use crate::sanitize::sanitize;
use crate::serializer::serialize;
use crate::tree::{Element, Fragment, Node};

/// Rendering engine for diagram source.
///
/// Implementations return the markup placed inside the diagram container
/// (an inline `<svg>` or an `<img>`). The markup is trusted and written
/// verbatim.
pub trait DiagramRenderer {
    /// Render `source`. `id` is unique per call.
    fn render(&self, id: &str, source: &str) -> Result<String, DiagramError>;
}

/// Options for [`ContentRenderer`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Run the allow-list sanitizer before scanning (default: true).
    pub sanitize: bool,
    /// Wrap pending images in placeholders (default: true).
    pub image_placeholders: bool,
    /// Minimum placeholder height in CSS pixels.
    pub image_min_height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sanitize: true,
            image_placeholders: true,
            image_min_height: DEFAULT_IMAGE_MIN_HEIGHT,
        }
    }
}

/// Outcome of a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Replaced by a diagram container.
    Rendered,
    /// Left in place and flagged with the error class.
    Failed(String),
}

/// Record of one processed candidate.
#[derive(Debug, Clone)]
pub struct BlockReport {
    /// The candidate as found by its scan.
    pub candidate: Candidate,
    /// Render id used for the call.
    pub id: String,
    /// What happened to the block.
    pub outcome: BlockOutcome,
}

/// Result of rendering a post body.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    fragment: Fragment,
    placeholders: PlaceholderSet,
    blocks: Vec<BlockReport>,
}

impl RenderOutput {
    /// Rendered tree.
    #[must_use]
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Serialized HTML of the rendered tree.
    #[must_use]
    pub fn html(&self) -> String {
        serialize(&self.fragment)
    }

    /// Every diagram candidate processed, in processing order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockReport] {
        &self.blocks
    }

    /// Number of diagrams rendered successfully.
    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.outcome == BlockOutcome::Rendered)
            .count()
    }

    /// Warnings for blocks that failed to render.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|b| match &b.outcome {
                BlockOutcome::Failed(message) => Some(message.clone()),
                BlockOutcome::Rendered => None,
            })
            .collect()
    }

    /// Image placeholders created or found in the rendered tree.
    #[must_use]
    pub fn placeholders(&self) -> &PlaceholderSet {
        &self.placeholders
    }

    /// Deliver a terminal load or error event to an image placeholder.
    ///
    /// Returns `true` the first time a placeholder settles; repeated or
    /// unknown events return `false` and leave the tree unchanged.
    pub fn settle_image(&mut self, id: &str, event: ImageEvent) -> bool {
        self.placeholders
            .settle(self.fragment.root_mut(), id, event)
    }
}

/// Renders post bodies.
///
/// Without a diagram renderer the diagram passes are skipped and only
/// sanitization and image placeholders apply.
pub struct ContentRenderer {
    diagrams: Option<Box<dyn DiagramRenderer>>,
    options: RenderOptions,
    /// Monotonic render-call counter, part of every render id.
    counter: u64,
}

impl Default for ContentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRenderer {
    /// Create a renderer with default options and no diagram engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            diagrams: None,
            options: RenderOptions::default(),
            counter: 0,
        }
    }

    /// Set the diagram rendering engine.
    #[must_use]
    pub fn with_diagrams(mut self, renderer: impl DiagramRenderer + 'static) -> Self {
        self.diagrams = Some(Box::new(renderer));
        self
    }

    /// Set rendering options.
    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Render a post body.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the HTML cannot be parsed. Diagram failures
    /// are never errors; they are reported per block on the output.
    pub fn render(&mut self, html: &str) -> Result<RenderOutput, ContentError> {
        let mut fragment = parse_fragment(html)?;
        if self.options.sanitize {
            sanitize(&mut fragment);
        }

        let mut blocks = Vec::new();
        if let Some(diagrams) = &self.diagrams {
            let counter = &mut self.counter;
            blocks = run_passes(&mut fragment, |candidate| {
                let id = next_render_id(counter);
                let outcome = match diagrams.render(&id, &candidate.text) {
                    Ok(markup) => Resolution::Replace(markup),
                    Err(e) => {
                        warn!(
                            "diagram rendering failed for {} block: {e}",
                            candidate.shape.as_str()
                        );
                        Resolution::Flag(e.to_string())
                    }
                };
                (id, outcome)
            });
        }

        let placeholders = if self.options.image_placeholders {
            wrap_images(&mut fragment, self.options.image_min_height)
        } else {
            PlaceholderSet::default()
        };

        Ok(RenderOutput {
            fragment,
            placeholders,
            blocks,
        })
    }
}

/// Find diagram candidates without rendering them.
///
/// Runs the same passes as [`ContentRenderer::render`], replacing matches with
/// empty containers so later passes see the same tree they would during a
/// real render.
///
/// # Errors
///
/// Returns [`ContentError`] if the HTML cannot be parsed.
pub fn find_diagrams(html: &str) -> Result<Vec<Candidate>, ContentError> {
    let mut fragment = parse_fragment(html)?;
    sanitize(&mut fragment);
    let mut counter = 0;
    let blocks = run_passes(&mut fragment, |_| {
        (next_render_id(&mut counter), Resolution::Replace(String::new()))
    });
    Ok(blocks.into_iter().map(|b| b.candidate).collect())
}

/// Decision for one candidate.
enum Resolution {
    Replace(String),
    Flag(String),
}

/// Run every pass in order, resolving candidates through `resolve`.
fn run_passes(
    fragment: &mut Fragment,
    mut resolve: impl FnMut(&Candidate) -> (String, Resolution),
) -> Vec<BlockReport> {
    let mut reports = Vec::new();

    for shape in CandidateShape::PASS_ORDER {
        let candidates = shape.scan(fragment.root());
        if candidates.is_empty() {
            continue;
        }
        debug!("{} pass: {} candidate(s)", shape.as_str(), candidates.len());

        let resolved: Vec<(Candidate, String, Resolution)> = candidates
            .into_iter()
            .map(|candidate| {
                let (id, resolution) = resolve(&candidate);
                (candidate, id, resolution)
            })
            .collect();

        // Apply last-first so earlier paths and indices stay valid
        let mut pass_reports = Vec::with_capacity(resolved.len());
        for (candidate, id, resolution) in resolved.into_iter().rev() {
            let outcome = apply(fragment.root_mut(), &candidate, resolution);
            pass_reports.push(BlockReport {
                candidate,
                id,
                outcome,
            });
        }
        pass_reports.reverse();
        reports.extend(pass_reports);
    }

    reports
}

/// Replace or flag the members of one candidate.
fn apply(root: &mut Element, candidate: &Candidate, resolution: Resolution) -> BlockOutcome {
    let Some(parent) = root.element_at_mut(&candidate.parent) else {
        return BlockOutcome::Failed("block parent no longer exists".to_owned());
    };

    match resolution {
        Resolution::Replace(markup) => {
            let container = Element::new("div")
                .with_attr("class", DIAGRAM_CLASS)
                .with_child(Node::Raw(markup));
            let first = candidate.first();
            parent.children.insert(first, Node::Element(container));
            // Members shifted by one after the insert
            for &member in candidate.members.iter().rev() {
                parent.children.remove(member + 1);
            }
            BlockOutcome::Rendered
        }
        Resolution::Flag(message) => {
            for &member in &candidate.members {
                if let Some(el) = parent.children.get_mut(member).and_then(Node::as_element_mut) {
                    el.add_class(DIAGRAM_ERROR_CLASS);
                }
            }
            BlockOutcome::Failed(message)
        }
    }
}

/// Next render id: `mermaid-{counter}-{unix millis}`.
fn next_render_id(counter: &mut u64) -> String {
    let id = *counter;
    *counter += 1;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    format!("{RENDER_ID_PREFIX}-{id}-{millis}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DIAGRAM_ERROR_CLASS, SKELETON_CLASS};
    use crate::error::DiagramErrorKind;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every call and fails for sources containing "FAIL".
    #[derive(Clone, Default)]
    struct FakeRenderer {
        calls: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl DiagramRenderer for FakeRenderer {
        fn render(&self, id: &str, source: &str) -> Result<String, DiagramError> {
            self.calls
                .borrow_mut()
                .push((id.to_owned(), source.to_owned()));
            if source.contains("FAIL") {
                return Err(DiagramError::new(
                    id,
                    DiagramErrorKind::Syntax("parse error".to_owned()),
                ));
            }
            Ok(format!("<svg data-n=\"{}\"></svg>", self.calls.borrow().len()))
        }
    }

    fn renderer(fake: &FakeRenderer) -> ContentRenderer {
        ContentRenderer::new()
            .with_diagrams(fake.clone())
            .with_options(RenderOptions {
                image_placeholders: false,
                ..RenderOptions::default()
            })
    }

    #[test]
    fn test_preformatted_block_replaced() {
        let fake = FakeRenderer::default();
        let output = renderer(&fake)
            .render("<p>intro</p><pre>graph TD\nA--&gt;B</pre><p>outro</p>")
            .unwrap();

        assert_eq!(
            output.html(),
            r#"<p>intro</p><div class="mermaid-diagram"><svg data-n="1"></svg></div><p>outro</p>"#
        );
        assert_eq!(fake.calls.borrow()[0].1, "graph TD\nA-->B");
        assert_eq!(output.rendered_count(), 1);
    }

    #[test]
    fn test_no_diagram_text_is_noop() {
        let fake = FakeRenderer::default();
        let html = r#"<h2>Title</h2><p>Plain <em>text</em></p><pre>fn main() {}</pre>"#;
        let output = renderer(&fake).render(html).unwrap();

        assert_eq!(output.fragment(), &parse_fragment(html).unwrap());
        assert!(fake.calls.borrow().is_empty());
        assert!(output.blocks().is_empty());
    }

    #[test]
    fn test_code_line_run_replaced_once() {
        let fake = FakeRenderer::default();
        let html = concat!(
            r#"<div class="ql-code-block-container">"#,
            r#"<div class="ql-code-block">graph LR</div>"#,
            r#"<div class="ql-code-block">A--&gt;B</div>"#,
            r#"<div class="ql-code-block">B--&gt;C</div>"#,
            "</div>",
        );
        let mut renderer = renderer(&fake);
        let output = renderer.render(html).unwrap();

        assert_eq!(
            output.html(),
            r#"<div class="ql-code-block-container"><div class="mermaid-diagram"><svg data-n="1"></svg></div></div>"#
        );
        assert_eq!(fake.calls.borrow().len(), 1);
        assert_eq!(fake.calls.borrow()[0].1, "graph LR\nA-->B\nB-->C");

        // Re-running on the output renders nothing new
        let again = renderer.render(&output.html()).unwrap();
        assert_eq!(fake.calls.borrow().len(), 1);
        assert_eq!(again.html(), output.html());
    }

    #[test]
    fn test_paragraph_run_replaced_fourth_untouched() {
        let fake = FakeRenderer::default();
        let output = renderer(&fake)
            .render("<p>graph TD;</p><p>A--&gt;B;</p><p></p><p>unrelated text</p>")
            .unwrap();

        assert_eq!(
            output.html(),
            r#"<div class="mermaid-diagram"><svg data-n="1"></svg></div><p>unrelated text</p>"#
        );
        assert_eq!(fake.calls.borrow()[0].1, "graph TD;\nA-->B;");
    }

    #[test]
    fn test_failure_flags_block_and_continues() {
        let fake = FakeRenderer::default();
        let html = "<pre>graph TD\nFAIL</pre><pre>pie\n\"a\": 1</pre>";
        let output = renderer(&fake).render(html).unwrap();

        assert_eq!(
            output.html(),
            r#"<pre class="mermaid-error">graph TD
FAIL</pre><div class="mermaid-diagram"><svg data-n="2"></svg></div>"#
        );
        assert_eq!(output.rendered_count(), 1);
        assert_eq!(output.warnings().len(), 1);
        assert!(output.warnings()[0].contains("parse error"));
    }

    #[test]
    fn test_failed_paragraph_run_flags_every_member() {
        let fake = FakeRenderer::default();
        let output = renderer(&fake)
            .render("<p>graph TD</p><p>FAIL</p><p>after</p>")
            .unwrap();

        let flagged = output
            .fragment()
            .root()
            .child_elements()
            .filter(|(_, el)| el.has_class(DIAGRAM_ERROR_CLASS))
            .count();
        assert_eq!(flagged, 3);
    }

    #[test]
    fn test_render_ids_unique_and_ordered() {
        let fake = FakeRenderer::default();
        let mut renderer = renderer(&fake);
        renderer
            .render("<pre>graph A</pre><pre>graph B</pre>")
            .unwrap();
        renderer.render("<pre>graph C</pre>").unwrap();

        let calls = fake.calls.borrow();
        let ids: Vec<&str> = calls.iter().map(|(id, _)| id.as_str()).collect();
        assert!(ids[0].starts_with("mermaid-0-"));
        assert!(ids[1].starts_with("mermaid-1-"));
        assert!(ids[2].starts_with("mermaid-2-"));
        assert_eq!(calls[0].1, "graph A");
        assert_eq!(calls[1].1, "graph B");
    }

    #[test]
    fn test_passes_run_in_order() {
        let fake = FakeRenderer::default();
        let html = concat!(
            "<p>graph P</p>",
            r#"<div class="ql-code-block">graph C</div>"#,
            "<pre>graph R</pre>",
        );
        let output = renderer(&fake).render(html).unwrap();

        let sources: Vec<String> = fake.calls.borrow().iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(sources, vec!["graph R", "graph C", "graph P"]);
        let shapes: Vec<CandidateShape> =
            output.blocks().iter().map(|b| b.candidate.shape).collect();
        assert_eq!(
            shapes,
            vec![
                CandidateShape::Preformatted,
                CandidateShape::CodeLineRun,
                CandidateShape::ParagraphRun
            ]
        );
    }

    #[test]
    fn test_without_diagram_engine_content_untouched() {
        let mut renderer = ContentRenderer::new().with_options(RenderOptions {
            image_placeholders: false,
            ..RenderOptions::default()
        });
        let output = renderer.render("<pre>graph TD</pre>").unwrap();
        assert_eq!(output.html(), "<pre>graph TD</pre>");
    }

    #[test]
    fn test_script_removed_before_scanning() {
        let fake = FakeRenderer::default();
        let output = renderer(&fake)
            .render("<script>x</script><pre>graph TD</pre>")
            .unwrap();
        assert_eq!(
            output.html(),
            r#"<div class="mermaid-diagram"><svg data-n="1"></svg></div>"#
        );
    }

    #[test]
    fn test_images_wrapped_and_settled() {
        let fake = FakeRenderer::default();
        let mut renderer = ContentRenderer::new().with_diagrams(fake);
        let mut output = renderer.render(r#"<p><img src="a.png"></p>"#).unwrap();

        assert_eq!(output.placeholders().len(), 1);
        assert!(output.html().contains(SKELETON_CLASS));

        assert!(output.settle_image("img-0", ImageEvent::Load));
        assert!(!output.html().contains(SKELETON_CLASS));
        assert!(!output.settle_image("img-0", ImageEvent::Error));
    }

    #[test]
    fn test_bare_ampersand_renders() {
        let fake = FakeRenderer::default();
        let output = renderer(&fake)
            .render("<p>Q & A</p><pre>graph TD</pre>")
            .unwrap();
        assert_eq!(
            output.html(),
            r#"<p>Q &amp; A</p><div class="mermaid-diagram"><svg data-n="1"></svg></div>"#
        );
    }

    #[test]
    fn test_arrows_in_diagram_source_kept() {
        let found = find_diagrams("<pre>graph TD\nA <-- B\nC --> D</pre>").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "graph TD\nA <-- B\nC --> D");
    }

    #[test]
    fn test_diagram_style_survives_render() {
        let mut renderer = ContentRenderer::new();
        let html = "<svg><style>.a > .b { x: 1 }</style></svg>";
        assert_eq!(renderer.render(html).unwrap().html(), html);
    }

    #[test]
    fn test_find_diagrams_lists_all_shapes() {
        let html = concat!(
            "<pre>gantt</pre>",
            r#"<div class="ql-code-block">mindmap</div>"#,
            "<p>timeline</p><p>2024 : x</p>",
        );
        let found = find_diagrams(html).unwrap();
        let texts: Vec<&str> = found.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["gantt", "mindmap", "timeline\n2024 : x"]);
    }
}
