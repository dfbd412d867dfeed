//! Mermaid diagram rendering via Kroki.
//!
//! This crate provides the diagram engine behind `tb-content`'s
//! [`DiagramRenderer`](tb_content::DiagramRenderer) seam:
//! - [`KrokiRenderer`]: HTTP rendering to inline SVG or PNG data URIs
//! - [`DiagramCache`]: content-addressed caching of rendered markup
//! - SVG post-processing (DPI scaling, font import removal)
//!
//! # Example
//!
//! ```no_run
//! use tb_content::ContentRenderer;
//! use tb_diagrams::{DiagramFormat, KrokiRenderer};
//!
//! let kroki = KrokiRenderer::new("https://kroki.io").with_format(DiagramFormat::Svg);
//! let mut renderer = ContentRenderer::new().with_diagrams(kroki);
//! let output = renderer.render("<pre>graph TD\nA--&gt;B</pre>").unwrap();
//! println!("{}", output.html());
//! ```

mod cache;
pub mod consts;
mod kroki;
mod svg;

pub use cache::{DiagramCache, DiagramKey, FileDiagramCache, NullDiagramCache};
pub use kroki::{DiagramFormat, KrokiRenderer, create_agent};
pub use svg::{prepare_svg, scale_svg_dimensions, strip_google_fonts_import};
