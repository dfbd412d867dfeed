//! Tolerant HTML fragment parser built on the `quick-xml` event reader.
//!
//! Post bodies are HTML, not XML, so the reader runs with end-name checks off
//! and the tree builder fills the gaps:
//! - void elements (`<br>`, `<img ...>`) never wait for a closing tag
//! - an end tag closes the nearest open element with that name; stray end
//!   tags are ignored
//! - elements still open at the end of input are closed implicitly
//! - HTML attribute syntax (unquoted and valueless attributes) is accepted
//! - a `&` that does not start a reference and a `<` that does not start
//!   markup are literal text
//! - a block-level start tag closes an open `<p>`, as in browsers
//!
//! Comments, doctypes, declarations and processing instructions are dropped.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::entities::decode_reference;
use crate::error::ContentError;
use crate::tree::{Element, Fragment, Node};

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Start tags that implicitly close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main",
    "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements that stop the search for an open `<p>`.
const PARAGRAPH_SCOPE: &[&str] = &[
    "button", "caption", "foreignobject", "table", "td", "template", "th",
];

/// Whether `tag` is an HTML void element.
pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Parse an HTML fragment into a [`Fragment`].
///
/// # Errors
///
/// Returns [`ContentError`] when the markup cannot be tokenized (for example
/// an unterminated tag).
pub fn parse_fragment(html: &str) -> Result<Fragment, ContentError> {
    let html = escape_bare_markup(html);
    let mut reader = Reader::from_str(&html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    // Open elements; index 0 is the synthetic root.
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = decode_element(&reader, &e)?;
                close_open_paragraph(&mut stack, &element.tag);
                if is_void(&element.tag) {
                    append(&mut stack, Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(e) => {
                let element = decode_element(&reader, &e)?;
                close_open_paragraph(&mut stack, &element.tag);
                append(&mut stack, Node::Element(element));
            }
            Event::End(e) => {
                let qname = e.name();
                let name = reader.decoder().decode(qname.as_ref())?;
                close(&mut stack, &name);
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                append_text(&mut stack, &text);
            }
            Event::GeneralRef(e) => {
                let name = reader.decoder().decode(&e)?;
                append_text(&mut stack, &decode_reference(&name));
            }
            Event::CData(e) => {
                append_text(&mut stack, &String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    let root = stack.pop().unwrap_or_default();
    Ok(Fragment::new(root.children))
}

/// Decode tag name and attributes of a start or empty tag.
fn decode_element(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<Element, ContentError> {
    let tag = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let mut element = Element::new(tag);

    for attr in e.html_attributes().flatten() {
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        // First occurrence wins, as in browsers
        if element.attr(&key).is_none() {
            element.attrs.push((key, value));
        }
    }

    Ok(element)
}

/// Append a node to the innermost open element.
fn append(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Append text, merging with a preceding text node.
fn append_text(stack: &mut [Element], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(Node::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(Node::text(text));
    }
}

/// Close the nearest open element named `name`, closing anything inside it.
fn close(stack: &mut Vec<Element>, name: &str) {
    let Some(pos) = stack.iter().rposition(|el| el.is(name)) else {
        return;
    };
    if pos == 0 {
        return;
    }
    while stack.len() > pos {
        pop_into_parent(stack);
    }
}

/// Close an open `<p>` in scope when `tag` starts a block.
fn close_open_paragraph(stack: &mut Vec<Element>, tag: &str) {
    if !CLOSES_PARAGRAPH.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        return;
    }
    for pos in (1..stack.len()).rev() {
        let el = &stack[pos];
        if el.is("p") {
            while stack.len() > pos {
                pop_into_parent(stack);
            }
            return;
        }
        if PARAGRAPH_SCOPE.iter().any(|t| el.is(t)) {
            return;
        }
    }
}

fn pop_into_parent(stack: &mut Vec<Element>) {
    if let Some(element) = stack.pop() {
        append(stack, Node::Element(element));
    }
}

/// Escape `&` and `<` that HTML reads as literal text.
///
/// The XML tokenizer rejects a `&` without a reference and reads any `<` as
/// the start of a tag. Comments and CDATA sections are copied unchanged.
fn escape_bare_markup(html: &str) -> Cow<'_, str> {
    let bytes = html.as_bytes();
    if !bytes.iter().any(|&b| b == b'&' || b == b'<') {
        return Cow::Borrowed(html);
    }

    let mut out = String::with_capacity(html.len() + 16);
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                let rest = &html[i..];
                if let Some(len) = opaque_section_len(rest) {
                    i += len;
                    continue;
                }
                if !starts_markup(rest) {
                    out.push_str(&html[last..i]);
                    out.push_str("&lt;");
                    last = i + 1;
                }
            }
            b'&' if !starts_reference(&bytes[i + 1..]) => {
                out.push_str(&html[last..i]);
                out.push_str("&amp;");
                last = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if last == 0 {
        return Cow::Borrowed(html);
    }
    out.push_str(&html[last..]);
    Cow::Owned(out)
}

/// Length of a comment or CDATA section at the start of `rest`.
fn opaque_section_len(rest: &str) -> Option<usize> {
    let (open, close) = if rest.starts_with("<!--") {
        ("<!--", "-->")
    } else if rest.starts_with("<![CDATA[") {
        ("<![CDATA[", "]]>")
    } else {
        return None;
    };
    let len = rest[open.len()..]
        .find(close)
        .map_or(rest.len(), |end| open.len() + end + close.len());
    Some(len)
}

/// Whether the `<` at the start of `rest` opens a tag, doctype or
/// processing instruction.
fn starts_markup(rest: &str) -> bool {
    let after = &rest.as_bytes()[1..];
    match after.first() {
        Some(b) if b.is_ascii_alphabetic() => true,
        Some(b'/') => after.get(1).is_some_and(u8::is_ascii_alphabetic),
        Some(b'!') => after
            .get(1..8)
            .is_some_and(|word| word.eq_ignore_ascii_case(b"DOCTYPE")),
        Some(b'?') => rest.contains("?>"),
        _ => false,
    }
}

/// Whether `after` (the bytes following a `&`) is a character reference.
fn starts_reference(after: &[u8]) -> bool {
    let (body, valid): (&[u8], fn(&u8) -> bool) = match after {
        [b'#', b'x' | b'X', rest @ ..] => (rest, u8::is_ascii_hexdigit),
        [b'#', rest @ ..] => (rest, u8::is_ascii_digit),
        [first, ..] if first.is_ascii_alphabetic() => (after, u8::is_ascii_alphanumeric),
        _ => return false,
    };
    let len = body.iter().take_while(|&b| valid(b)).count();
    len > 0 && body.get(len) == Some(&b';')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_element(fragment: &Fragment) -> &Element {
        fragment.children()[0].as_element().unwrap()
    }

    #[test]
    fn test_parse_simple_paragraph() {
        let fragment = parse_fragment("<p>Hello</p>").unwrap();
        let p = first_element(&fragment);
        assert_eq!(p.tag, "p");
        assert_eq!(p.text_content(), "Hello");
    }

    #[test]
    fn test_parse_void_elements_without_slash() {
        let fragment = parse_fragment(r#"<p><br></p><p><img src="a.png" alt="x">after</p>"#).unwrap();
        assert_eq!(fragment.children().len(), 2);

        let first = first_element(&fragment);
        assert_eq!(first.children.len(), 1);
        assert_eq!(first.children[0].as_element().unwrap().tag, "br");

        let second = fragment.children()[1].as_element().unwrap();
        let img = second.children[0].as_element().unwrap();
        assert_eq!(img.attr("src"), Some("a.png"));
        assert_eq!(second.children[1], Node::text("after"));
    }

    #[test]
    fn test_parse_entities_in_text() {
        let fragment = parse_fragment("<p>A--&gt;B;&nbsp;x &amp; y</p>").unwrap();
        assert_eq!(first_element(&fragment).text_content(), "A-->B;\u{a0}x & y");
    }

    #[test]
    fn test_parse_html_attribute_syntax() {
        let fragment = parse_fragment("<pre spellcheck=false data-language=plain>x</pre>").unwrap();
        let pre = first_element(&fragment);
        assert_eq!(pre.attr("spellcheck"), Some("false"));
        assert_eq!(pre.attr("data-language"), Some("plain"));
    }

    #[test]
    fn test_parse_stray_end_tag_ignored() {
        let fragment = parse_fragment("<p>one</span></p><p>two</p>").unwrap();
        assert_eq!(fragment.children().len(), 2);
        assert_eq!(first_element(&fragment).text_content(), "one");
    }

    #[test]
    fn test_parse_unclosed_elements_closed_at_end() {
        let fragment = parse_fragment("<div><p>open").unwrap();
        let div = first_element(&fragment);
        assert_eq!(div.tag, "div");
        assert_eq!(div.children[0].as_element().unwrap().text_content(), "open");
    }

    #[test]
    fn test_parse_end_tag_closes_inner_elements() {
        let fragment = parse_fragment("<div><p>inner</div><p>next</p>").unwrap();
        assert_eq!(fragment.children().len(), 2);
        assert_eq!(fragment.children()[1].text_content(), "next");
    }

    #[test]
    fn test_parse_drops_comments() {
        let fragment = parse_fragment("<p>a<!-- note -->b</p>").unwrap();
        let p = first_element(&fragment);
        assert_eq!(p.children, vec![Node::text("ab")]);
    }

    #[test]
    fn test_parse_top_level_text() {
        let fragment = parse_fragment("lead <em>x</em> tail").unwrap();
        assert_eq!(fragment.children().len(), 3);
        assert_eq!(fragment.text_content(), "lead x tail");
    }

    #[test]
    fn test_parse_bare_ampersand_is_text() {
        let fragment = parse_fragment("<p>Q & A</p><p>AT&T; x&y &#;</p>").unwrap();
        assert_eq!(fragment.children()[0].text_content(), "Q & A");
        assert_eq!(fragment.children()[1].text_content(), "AT&T; x&y &#;");
    }

    #[test]
    fn test_parse_bare_less_than_is_text() {
        let fragment = parse_fragment("<pre>graph TD\nA <-- B\nC --> D\n1 < 2</pre>").unwrap();
        assert_eq!(fragment.children().len(), 1);
        assert_eq!(
            first_element(&fragment).text_content(),
            "graph TD\nA <-- B\nC --> D\n1 < 2"
        );
    }

    #[test]
    fn test_parse_bare_markup_in_attribute() {
        let fragment = parse_fragment(r#"<a href="?a=1&b=2" title="x < y">l</a>"#).unwrap();
        let a = first_element(&fragment);
        assert_eq!(a.attr("href"), Some("?a=1&b=2"));
        assert_eq!(a.attr("title"), Some("x < y"));
    }

    #[test]
    fn test_parse_comment_and_cdata_left_intact() {
        let fragment = parse_fragment("<p>a<!-- 1 < 2 & 3 -->b<![CDATA[<x> & y]]></p>").unwrap();
        assert_eq!(first_element(&fragment).text_content(), "ab<x> & y");
    }

    #[test]
    fn test_parse_block_start_closes_open_paragraph() {
        let fragment = parse_fragment("<p>graph TD<p>A--&gt;B<div>x</div>").unwrap();
        let tags: Vec<&str> = fragment
            .children()
            .iter()
            .filter_map(Node::as_element)
            .map(|el| el.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["p", "p", "div"]);
        assert_eq!(fragment.children()[1].text_content(), "A-->B");
    }

    #[test]
    fn test_parse_inline_start_keeps_paragraph_open() {
        let fragment = parse_fragment("<p>a<em>b</em>c</p>").unwrap();
        assert_eq!(fragment.children().len(), 1);
        assert_eq!(first_element(&fragment).children.len(), 3);
    }

    #[test]
    fn test_parse_paragraph_not_closed_across_button() {
        let fragment = parse_fragment("<p>a<button><div>x</div></button>b</p>").unwrap();
        assert_eq!(fragment.children().len(), 1);
        assert_eq!(first_element(&fragment).text_content(), "axb");
    }

    #[test]
    fn test_escape_bare_markup_borrows_clean_input() {
        assert!(matches!(escape_bare_markup("<p>plain &amp; x</p>"), Cow::Borrowed(_)));
        assert!(matches!(escape_bare_markup("no markup"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_parse_empty_input() {
        let fragment = parse_fragment("").unwrap();
        assert!(fragment.children().is_empty());
    }
}
