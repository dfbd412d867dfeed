//! Render session keyed by content identity.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ContentError;
use crate::renderer::{ContentRenderer, RenderOutput};

/// Renders a post body again only when its content changes.
///
/// The identity of a body is the SHA-256 of its text. Updating with the same
/// text is a no-op, so repeated refreshes never re-issue diagram calls.
pub struct RenderSession {
    renderer: ContentRenderer,
    key: Option<String>,
    output: Option<RenderOutput>,
}

impl RenderSession {
    /// Create a session around a renderer.
    #[must_use]
    pub fn new(renderer: ContentRenderer) -> Self {
        Self {
            renderer,
            key: None,
            output: None,
        }
    }

    /// Render `content` if it differs from the last rendered content.
    ///
    /// Returns the new output on change and `None` when the content identity
    /// is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the content cannot be parsed. The previous
    /// output is kept in that case.
    pub fn update(&mut self, content: &str) -> Result<Option<&RenderOutput>, ContentError> {
        let key = content_key(content);
        if self.key.as_deref() == Some(key.as_str()) {
            debug!("content {} unchanged, skipping render", &key[..12]);
            return Ok(None);
        }

        let output = self.renderer.render(content)?;
        self.key = Some(key);
        let output: &RenderOutput = self.output.insert(output);
        Ok(Some(output))
    }

    /// Output of the last successful render.
    #[must_use]
    pub fn output(&self) -> Option<&RenderOutput> {
        self.output.as_ref()
    }

    /// Mutable output, for delivering image events.
    pub fn output_mut(&mut self) -> Option<&mut RenderOutput> {
        self.output.as_mut()
    }
}

/// Hex SHA-256 of the content.
#[must_use]
pub fn content_key(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
