//! Rich content rendering for blog post bodies.
//!
//! Post bodies arrive as editor-produced HTML. This crate parses them into an
//! owned tree, strips anything outside the allow-list, replaces embedded
//! Mermaid diagram definitions with rendered diagrams and wraps pending images
//! in loading placeholders.
//!
//! Diagram source is recognized in three authoring shapes (see
//! [`CandidateShape`]). Rendering itself is delegated to a
//! [`DiagramRenderer`] implementation such as the Kroki client in
//! `tb-diagrams`.
//!
//! # Example
//!
//! ```
//! use tb_content::ContentRenderer;
//!
//! let mut renderer = ContentRenderer::new();
//! let output = renderer.render("<p>Hello <em>world</em></p>").unwrap();
//! assert_eq!(output.html(), "<p>Hello <em>world</em></p>");
//! ```

mod candidate;
pub mod consts;
mod entities;
mod error;
mod excerpt;
mod grammar;
mod images;
mod parser;
mod renderer;
mod sanitize;
mod serializer;
mod session;
mod tree;

pub use candidate::{Candidate, CandidateShape};
pub use error::{ContentError, DiagramError, DiagramErrorKind};
pub use excerpt::{excerpt, slugify};
pub use grammar::{DIAGRAM_KEYWORDS, diagram_keyword, is_diagram_definition};
pub use images::{ImageEvent, ImagePlaceholder, ImageState, PlaceholderSet, wrap_images};
pub use parser::parse_fragment;
pub use renderer::{
    BlockOutcome, BlockReport, ContentRenderer, DiagramRenderer, RenderOptions, RenderOutput,
    find_diagrams,
};
pub use sanitize::sanitize;
pub use serializer::{serialize, serialize_element};
pub use session::{RenderSession, content_key};
pub use tree::{Element, Fragment, Node, NodePath};
