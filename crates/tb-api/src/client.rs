//! Blog posts REST API client.
//!
//! Synchronous, read-only. Each call is made once; failures are returned to
//! the caller without retry.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use tracing::info;
use ureq::Agent;

use crate::error::ApiError;
use crate::types::{Post, PostPage};

/// Characters left unescaped in path segments and query values.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Blog posts API client.
pub struct PostClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl PostClient {
    /// Create a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer {token}` with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a post by its slug.
    pub fn get_post_by_slug(&self, slug: &str) -> Result<Post, ApiError> {
        info!("Getting post by slug {slug}");
        self.get_json(&self.slug_url(slug))
    }

    /// Fetch a post by its numeric id.
    pub fn get_post_by_id(&self, id: u64) -> Result<Post, ApiError> {
        info!("Getting post {id}");
        self.get_json(&self.id_url(id))
    }

    /// Fetch one page of posts, optionally filtered by category name.
    pub fn list_posts(
        &self,
        page: u32,
        size: u32,
        category: Option<&str>,
    ) -> Result<PostPage, ApiError> {
        info!("Listing posts (page {page}, size {size})");
        self.get_json(&self.list_url(page, size, category))
    }

    fn slug_url(&self, slug: &str) -> String {
        format!("{}/post/slug/{}", self.base_url, encode(slug))
    }

    fn id_url(&self, id: u64) -> String {
        format!("{}/post/id/{id}", self.base_url)
    }

    fn list_url(&self, page: u32, size: u32, category: Option<&str>) -> String {
        let mut url = format!("{}/post?page={page}&size={size}", self.base_url);
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            url.push_str("&categoryName=");
            url.push_str(&encode(category));
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let mut request = self.agent.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let response = request.call()?;
        let status = response.status().as_u16();
        let mut body_reader = response.into_body();

        if status >= 400 {
            let error_body = body_reader
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(ApiError::HttpResponse {
                status,
                body: error_body,
            });
        }

        let body = body_reader.read_to_string()?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}
