//! Error types for the blog API client.

/// Error from blog API operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Transport failure before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    /// The server answered with an error status.
    #[error("HTTP {status}: {body}")]
    HttpResponse { status: u16, body: String },

    /// Response body is not the expected JSON.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Json(e.to_string())
    }
}

impl From<ureq::Error> for ApiError {
    fn from(e: ureq::Error) -> Self {
        ApiError::HttpRequest(e.to_string())
    }
}
