//! Read-only client for the blog posts REST API.
//!
//! Provides typed access to the endpoints the blog pages consume:
//! - `GET /post/slug/{slug}` and `GET /post/id/{id}` for a single post
//! - `GET /post?page=&size=&categoryName=` for paged listings

mod client;
mod error;
mod types;

pub use client::PostClient;
pub use error::ApiError;
pub use types::{Author, Category, DRAFT_LABEL, Post, PostPage, Tags, UNCATEGORIZED_LABEL};
