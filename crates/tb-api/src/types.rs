//! Blog API payload types.
//!
//! Field names follow the JSON the server sends (`camelCase`). Everything the
//! server may omit is optional so partial payloads still deserialize.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Shown instead of a date for unpublished posts.
pub const DRAFT_LABEL: &str = "Draft";

/// Shown for posts without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// A blog post.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub slug: String,
    /// Sanitized HTML body.
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Tags>,
    pub author: Option<Author>,
    pub category: Option<Category>,
    /// Publication timestamp as sent by the server; absent for drafts.
    pub published_at: Option<String>,
    pub updated_at: Option<String>,
    pub like_count: u64,
    pub view_count: u64,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
}

impl Post {
    /// Publication date as `MMM dd, yyyy`, or `Draft` when unpublished or
    /// unparseable.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.published_at
            .as_deref()
            .and_then(parse_timestamp)
            .map_or_else(
                || DRAFT_LABEL.to_owned(),
                |ts| ts.format("%b %d, %Y").to_string(),
            )
    }

    /// Category name, or `Uncategorized`.
    #[must_use]
    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNCATEGORIZED_LABEL)
    }

    /// Tag names in server order.
    #[must_use]
    pub fn tag_names(&self) -> &[String] {
        self.tags
            .as_ref()
            .map(|t| t.tag_names.as_slice())
            .unwrap_or_default()
    }
}

/// Parse a server timestamp: RFC 3339 or a local date-time without offset.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Post author.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    pub username: String,
    /// Avatar image URL.
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
}

/// Post category.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Category {
    pub id: Option<u64>,
    pub name: String,
}

/// Tag list, sent as `{"tagNames": [...]}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tags {
    pub tag_names: Vec<String>,
}

/// One page of posts.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostPage {
    pub content: Vec<Post>,
    pub total_pages: u32,
    pub total_elements: u64,
    /// Zero-based page number.
    pub number: u32,
    pub size: u32,
    pub last: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const POST_JSON: &str = r#"{
        "id": 42,
        "title": "Drawing with Mermaid",
        "slug": "Drawing-with-Mermaid",
        "content": "<pre>graph TD\nA--&gt;B</pre>",
        "thumbnailUrl": "https://cdn.example.com/t.png",
        "tags": {"tagNames": ["rust", "diagrams"]},
        "author": {"username": "kim", "profileImageUrl": null, "bio": "Writes things"},
        "category": {"id": 3, "name": "Tutorials"},
        "publishedAt": "2024-03-05T09:15:00",
        "likeCount": 7,
        "viewCount": 120
    }"#;

    #[test]
    fn test_post_deserializes() {
        let post: Post = serde_json::from_str(POST_JSON).unwrap();
        assert_eq!(post.id, 42);
        assert_eq!(post.slug, "Drawing-with-Mermaid");
        assert_eq!(post.tag_names(), ["rust", "diagrams"]);
        assert_eq!(post.author.as_ref().unwrap().username, "kim");
        assert!(post.author.as_ref().unwrap().profile_image_url.is_none());
        assert_eq!(post.like_count, 7);
        assert!(post.seo_title.is_none());
    }

    #[test]
    fn test_display_date() {
        let post: Post = serde_json::from_str(POST_JSON).unwrap();
        assert_eq!(post.display_date(), "Mar 05, 2024");

        let zoned = Post {
            published_at: Some("2023-12-31T23:00:00Z".to_owned()),
            ..Post::default()
        };
        assert_eq!(zoned.display_date(), "Dec 31, 2023");

        assert_eq!(Post::default().display_date(), "Draft");
    }

    #[test]
    fn test_category_name_fallback() {
        let post: Post = serde_json::from_str(POST_JSON).unwrap();
        assert_eq!(post.category_name(), "Tutorials");
        assert_eq!(Post::default().category_name(), "Uncategorized");
    }

    #[test]
    fn test_post_page_deserializes() {
        let json = format!(
            r#"{{"content": [{POST_JSON}], "totalPages": 4, "totalElements": 31, "number": 0, "size": 10, "last": false}}"#
        );
        let page: PostPage = serde_json::from_str(&json).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.total_pages, 4);
        assert!(!page.last);
    }

    #[test]
    fn test_minimal_post() {
        let post: Post = serde_json::from_str(r#"{"id": 1, "title": "t"}"#).unwrap();
        assert!(post.tag_names().is_empty());
        assert_eq!(post.content, "");
    }
}
