//! Plain-text helpers for post listings.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ContentError;
use crate::parser::parse_fragment;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Plain-text excerpt of a post body.
///
/// Tags are stripped and only text content is kept. Text longer than
/// `max_chars` characters is cut at that count and `...` appended.
///
/// # Errors
///
/// Returns [`ContentError`] if the body cannot be parsed.
pub fn excerpt(html: &str, max_chars: usize) -> Result<String, ContentError> {
    let text = parse_fragment(html)?.text_content();
    if text.chars().count() <= max_chars {
        return Ok(text);
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    Ok(cut)
}

/// Link slug for a title: trimmed, whitespace runs replaced by `-`.
#[must_use]
pub fn slugify(title: &str) -> String {
    WHITESPACE_RUN.replace_all(title.trim(), "-").into_owned()
}
