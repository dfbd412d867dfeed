//! HTML serializer for [`Fragment`] trees.

use crate::parser::is_void;
use crate::tree::{Element, Fragment, Node};

/// Elements whose text content is not entity-decoded by browsers.
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

/// Serialize a fragment to HTML.
///
/// Void elements are written without a closing tag, text and attribute values
/// are escaped, and [`Node::Raw`] markup is written verbatim. Text inside
/// raw-text elements (`style`) is written verbatim unless it could close the
/// element early.
#[must_use]
pub fn serialize(fragment: &Fragment) -> String {
    let mut out = String::with_capacity(4096);
    for child in fragment.children() {
        serialize_node(child, &mut out);
    }
    out
}

/// Serialize a single element with its subtree.
#[must_use]
pub fn serialize_element(element: &Element) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => write_element(el, out),
        Node::Text(text) => escape_into(text, false, out),
        Node::Raw(markup) => out.push_str(markup),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (key, value) in &el.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');

    if is_void(&el.tag) {
        return;
    }

    let raw_text = RAW_TEXT_ELEMENTS.iter().any(|tag| el.is(tag));
    for child in &el.children {
        match child {
            Node::Text(text) if raw_text && !text.contains("</") => out.push_str(text),
            _ => serialize_node(child, out),
        }
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

/// Escape special characters for text content or attribute values.
fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
