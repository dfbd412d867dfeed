//! Owned HTML tree shared by every content pass.
//!
//! Elements are addressed by [`NodePath`]: the sequence of child indices from
//! the fragment root. Passes collect paths while scanning and apply their
//! edits afterwards, last path first, so pending paths stay valid.

/// Child indices from the fragment root to an element.
pub type NodePath = Vec<usize>;

/// A node in a parsed HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Decoded character data.
    Text(String),
    /// Trusted markup written verbatim (rendered diagrams).
    Raw(String),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Borrow the element, if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutably borrow the element, if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Text content of this node and its descendants (DOM `textContent`).
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Element(el) => el.collect_text(out),
            Self::Text(text) => out.push_str(text),
            Self::Raw(_) => {}
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

/// An HTML element.
///
/// Attributes keep their source order so that serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written in the source.
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag and no attributes.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(&name.into(), value);
        self
    }

    /// Append a child node.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Whether the tag name matches, ignoring ASCII case.
    #[must_use]
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name.to_owned(), value));
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(pos).1)
    }

    /// Iterate over the class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Whether the element carries a class.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class unless already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attr("class", value);
    }

    /// Remove a class. Returns `false` if it was not present.
    pub fn remove_class(&mut self, class: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            let value = remaining.join(" ");
            self.set_attr("class", value);
        }
        true
    }

    /// Set one inline style property, keeping the others in order.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let mut declarations: Vec<(String, String)> = self
            .attr("style")
            .unwrap_or("")
            .split(';')
            .filter_map(|decl| {
                let (prop, val) = decl.split_once(':')?;
                Some((prop.trim().to_owned(), val.trim().to_owned()))
            })
            .collect();

        if let Some(slot) = declarations.iter_mut().find(|(prop, _)| prop == property) {
            value.clone_into(&mut slot.1);
        } else {
            declarations.push((property.to_owned(), value.to_owned()));
        }

        let style = declarations
            .iter()
            .map(|(prop, val)| format!("{prop}: {val}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", style);
    }

    /// Inline style property value.
    #[must_use]
    pub fn style(&self, property: &str) -> Option<&str> {
        self.attr("style")?.split(';').find_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            (prop.trim() == property).then_some(val.trim())
        })
    }

    /// Text content of the element's descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Child elements with their indices in `children`, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_element().map(|el| (i, el)))
    }

    /// Index of the next element sibling after `index`.
    #[must_use]
    pub fn next_element_index(&self, index: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .skip(index + 1)
            .find_map(|(i, node)| node.as_element().map(|_| i))
    }

    /// Descendant element at `path`. The empty path is `self`.
    #[must_use]
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        path.iter().try_fold(self, |el, &index| {
            el.children.get(index).and_then(Node::as_element)
        })
    }

    /// Mutable descendant element at `path`. The empty path is `self`.
    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        path.iter().try_fold(self, |el, &index| {
            el.children.get_mut(index).and_then(Node::as_element_mut)
        })
    }
}

/// A parsed HTML fragment: the children of a synthetic root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    root: Element,
}

impl Fragment {
    /// Create a fragment from top-level nodes.
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            root: Element {
                children,
                ..Default::default()
            },
        }
    }

    /// The synthetic root. Paths are relative to it.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Mutable synthetic root.
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Top-level nodes.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.root.children
    }

    /// Text content of the whole fragment.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.root.text_content()
    }
}
