//! Allow-list sanitizer for post bodies.
//!
//! Keeps the markup the post editor produces plus the vector-graphic elements
//! and presentation attributes rendered diagrams need. Everything else is
//! removed:
//! - executable or embedding elements are dropped together with their content
//! - other unknown elements are unwrapped, keeping their children
//! - attributes outside the allow-list, event handlers and script URLs are
//!   stripped

use crate::tree::{Element, Fragment, Node};

/// HTML elements kept as-is.
const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "audio", "b", "bdi", "bdo", "blockquote", "br",
    "caption", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn", "div", "dl",
    "dt", "em", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "i", "img", "ins", "kbd", "li", "main", "mark", "nav", "ol", "p", "picture", "pre",
    "q", "s", "samp", "section", "small", "source", "span", "strong", "sub", "summary", "sup",
    "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "track", "u", "ul", "var",
    "video", "wbr",
];

/// Vector-graphic elements allowed so rendered diagrams survive cleaning.
const SVG_TAGS: &[&str] = &[
    "svg",
    "path",
    "g",
    "defs",
    "marker",
    "style",
    "title",
    "desc",
    "ellipse",
    "line",
    "polygon",
    "polyline",
    "rect",
    "text",
    "tspan",
    "use",
    "symbol",
    "foreignobject",
    "circle",
];

/// Elements removed together with everything inside them.
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "iframe", "object", "embed", "noscript", "template", "frame", "frameset", "xmp",
    "noembed", "plaintext",
];

/// Attributes kept on any allowed element.
const ALLOWED_ATTRS: &[&str] = &[
    "alt",
    "class",
    "cite",
    "colspan",
    "controls",
    "datetime",
    "dir",
    "height",
    "href",
    "id",
    "lang",
    "loop",
    "muted",
    "poster",
    "rel",
    "reversed",
    "role",
    "rowspan",
    "spellcheck",
    "src",
    "srcset",
    "start",
    "style",
    "target",
    "title",
    "type",
    "width",
    // Vector-graphic presentation attributes
    "alignment-baseline",
    "cx",
    "cy",
    "d",
    "dominant-baseline",
    "fill",
    "font-family",
    "font-size",
    "marker-end",
    "marker-start",
    "markerheight",
    "markerwidth",
    "opacity",
    "orient",
    "points",
    "preserveaspectratio",
    "r",
    "refx",
    "refy",
    "rx",
    "ry",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-width",
    "text-anchor",
    "transform",
    "viewbox",
    "x",
    "x1",
    "x2",
    "xlink:href",
    "xmlns",
    "xmlns:xlink",
    "y",
    "y1",
    "y2",
];

/// Attributes holding URLs that must not carry script schemes.
const URL_ATTRS: &[&str] = &["href", "src", "xlink:href", "poster", "cite"];

/// Remove everything outside the allow-list, in place.
pub fn sanitize(fragment: &mut Fragment) {
    let root = fragment.root_mut();
    let children = std::mem::take(&mut root.children);
    root.children = sanitize_nodes(children);
}

fn sanitize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(mut el) => {
                let tag = el.tag.to_ascii_lowercase();
                if contains(DROP_WITH_CONTENT, &tag) {
                    continue;
                }
                let children = std::mem::take(&mut el.children);
                let children = sanitize_nodes(children);
                if contains(HTML_TAGS, &tag) || contains(SVG_TAGS, &tag) {
                    el.children = children;
                    sanitize_attrs(&mut el);
                    out.push(Node::Element(el));
                } else {
                    out.extend(children);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn sanitize_attrs(el: &mut Element) {
    el.attrs.retain(|(key, value)| {
        let key = key.to_ascii_lowercase();
        let allowed = contains(ALLOWED_ATTRS, &key)
            || key.starts_with("data-")
            || key.starts_with("aria-");
        if !allowed || key.starts_with("on") {
            return false;
        }
        !(contains(URL_ATTRS, &key) && is_unsafe_url(value))
    });
}

/// Whether a URL uses a scheme that can run code.
fn is_unsafe_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    if normalized.starts_with("javascript:") || normalized.starts_with("vbscript:") {
        return true;
    }
    normalized.starts_with("data:") && !normalized.starts_with("data:image/")
}

fn contains(list: &[&str], value: &str) -> bool {
    list.contains(&value)
}
