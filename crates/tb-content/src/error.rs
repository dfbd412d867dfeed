//! Error types for content rendering.

/// Error while parsing a post body.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ContentError {
    /// Markup the reader could not tokenize.
    #[error("HTML parse error")]
    Parse(#[from] quick_xml::Error),

    /// Encoding error while decoding names or text.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}

/// Failure to render a single diagram.
///
/// Carries the render id so that log lines can be matched to blocks.
#[derive(Debug, thiserror::Error)]
#[error("diagram {id}: {kind}")]
pub struct DiagramError {
    /// Render id of the failed call.
    pub id: String,
    /// What went wrong.
    pub kind: DiagramErrorKind,
}

impl DiagramError {
    /// Create an error for the given render id.
    pub fn new(id: impl Into<String>, kind: DiagramErrorKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Kind of diagram rendering error.
#[derive(Debug, thiserror::Error)]
pub enum DiagramErrorKind {
    /// Transport failure or error status from the rendering service.
    #[error("HTTP error: {0}")]
    Http(String),
    /// Reading the response failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// The service rejected the diagram source.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// The service returned something that is not a PNG.
    #[error("invalid PNG data")]
    InvalidPng,
}
