//! Kroki-backed diagram rendering.
//!
//! [`KrokiRenderer`] implements [`DiagramRenderer`] by POSTing Mermaid source
//! to `{server_url}/mermaid/{format}`:
//! - SVG output is trimmed, cleaned of font imports and scaled for the DPI
//! - PNG output is validated and embedded as a base64 data URI, sized for the
//!   DPI like SVG output
//!
//! Results are cached by content hash, so unchanged diagrams never hit the
//! network twice.

use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use tb_content::{DiagramError, DiagramErrorKind, DiagramRenderer};
use tracing::{debug, info};
use ureq::Agent;

use crate::cache::{DiagramCache, DiagramKey, NullDiagramCache};
use crate::consts::{DEFAULT_DPI, DEFAULT_TIMEOUT_SECS, MERMAID_ENDPOINT};
use crate::svg::{display_size, prepare_svg};

/// Output format requested from Kroki.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiagramFormat {
    /// Inline `<svg>` markup.
    #[default]
    Svg,
    /// `<img>` with a PNG data URI.
    Png,
}

impl DiagramFormat {
    /// Format name as used in Kroki URLs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// Create HTTP agent with the specified timeout.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Diagram renderer backed by a Kroki server.
pub struct KrokiRenderer {
    agent: Agent,
    server_url: String,
    format: DiagramFormat,
    dpi: u32,
    cache: Box<dyn DiagramCache>,
}

impl KrokiRenderer {
    /// Create a renderer for `server_url` with SVG output, default DPI and
    /// no cache.
    #[must_use]
    pub fn new(server_url: &str) -> Self {
        Self {
            agent: create_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            server_url: server_url.trim_end_matches('/').to_owned(),
            format: DiagramFormat::Svg,
            dpi: DEFAULT_DPI,
            cache: Box::new(NullDiagramCache),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: DiagramFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the rendering DPI.
    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Set the diagram cache.
    #[must_use]
    pub fn with_cache(mut self, cache: impl DiagramCache + 'static) -> Self {
        self.cache = Box::new(cache);
        self
    }

    /// Kroki server URL, without trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Send the source to Kroki and return the response body.
    fn send(&self, id: &str, source: &str) -> Result<Vec<u8>, DiagramError> {
        let url = format!(
            "{}/{MERMAID_ENDPOINT}/{}",
            self.server_url,
            self.format.as_str()
        );
        info!("POST {url} ({id})");

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| DiagramError::new(id, DiagramErrorKind::Http(e.to_string())))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            let kind = if status == 400 {
                DiagramErrorKind::Syntax(error_body.trim().to_owned())
            } else {
                DiagramErrorKind::Http(format!("HTTP {status}: {error_body}"))
            };
            return Err(DiagramError::new(id, kind));
        }

        body.read_to_vec()
            .map_err(|e| DiagramError::new(id, DiagramErrorKind::Io(e.to_string())))
    }

    fn render_svg(&self, id: &str, source: &str) -> Result<String, DiagramError> {
        let data = self.send(id, source)?;
        let svg = String::from_utf8(data).map_err(|e| {
            DiagramError::new(id, DiagramErrorKind::Io(format!("invalid UTF-8 in SVG: {e}")))
        })?;
        Ok(prepare_svg(&svg, self.dpi))
    }

    fn render_png(&self, id: &str, source: &str) -> Result<String, DiagramError> {
        let data = self.send(id, source)?;
        png_markup(&data, self.dpi)
            .ok_or_else(|| DiagramError::new(id, DiagramErrorKind::InvalidPng))
    }
}

impl DiagramRenderer for KrokiRenderer {
    fn render(&self, id: &str, source: &str) -> Result<String, DiagramError> {
        let key = DiagramKey {
            source,
            endpoint: MERMAID_ENDPOINT,
            format: self.format.as_str(),
            dpi: self.dpi,
        };
        if let Some(cached) = self.cache.get(key) {
            debug!("{id}: cache hit");
            return Ok(cached);
        }

        let markup = match self.format {
            DiagramFormat::Svg => self.render_svg(id, source)?,
            DiagramFormat::Png => self.render_png(id, source)?,
        };
        self.cache.set(key, &markup);
        Ok(markup)
    }
}

/// `<img>` embedding PNG data, sized for display at standard DPI.
fn png_markup(data: &[u8], dpi: u32) -> Option<String> {
    let (width, height) = get_png_dimensions(data)?;
    let width = display_size(f64::from(width), dpi);
    let height = display_size(f64::from(height), dpi);
    debug!("PNG {width}x{height} at {dpi} DPI");

    let base64 = BASE64_STANDARD.encode(data);
    Some(format!(
        r#"<img src="data:image/png;base64,{base64}" alt="diagram" width="{width}" height="{height}">"#
    ))
}

/// Extract width and height from PNG image data.
///
/// PNG format: 8-byte signature, then IHDR chunk with width/height at bytes 16-24.
fn get_png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || &data[0..8] != b"\x89PNG\r\n\x1a\n" {
        return None;
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}
