//! Loading placeholders for post images.
//!
//! Every image that is not already complete is wrapped in a skeleton
//! container while it loads. The first load or error event settles the
//! placeholder; later events are ignored.

use std::collections::HashSet;

use crate::consts::{
    IMAGE_TRANSITION, LOADED_ATTR, PLACEHOLDER_CLASS, PLACEHOLDER_ID_ATTR, SKELETON_CLASS,
};
use crate::tree::{Element, Fragment, Node};

/// Load state of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Loading,
    Loaded,
    Errored,
}

/// Terminal image event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEvent {
    Load,
    Error,
}

/// A wrapped image and its load state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlaceholder {
    /// Placeholder id, `img-{n}`.
    pub id: String,
    /// Image source, if the element has one.
    pub src: Option<String>,
    state: ImageState,
}

impl ImagePlaceholder {
    fn new(id: String, src: Option<String>) -> Self {
        Self {
            id,
            src,
            state: ImageState::Loading,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ImageState {
        self.state
    }

    /// Apply an event. Returns `true` only for the transition out of `Loading`.
    pub fn settle(&mut self, event: ImageEvent) -> bool {
        if self.state != ImageState::Loading {
            return false;
        }
        self.state = match event {
            ImageEvent::Load => ImageState::Loaded,
            ImageEvent::Error => ImageState::Errored,
        };
        true
    }
}

/// Placeholders of one rendered tree, in document order.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderSet {
    items: Vec<ImagePlaceholder>,
}

impl PlaceholderSet {
    /// Look up a placeholder by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ImagePlaceholder> {
        self.items.iter().find(|p| p.id == id)
    }

    /// Number of placeholders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no placeholders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ImagePlaceholder> {
        self.items.iter()
    }

    /// Settle placeholder `id` and update its wrapper in `root`.
    ///
    /// The wrapper loses the skeleton class and the image becomes opaque.
    /// Returns `false` for unknown ids and for placeholders already settled.
    pub fn settle(&mut self, root: &mut Element, id: &str, event: ImageEvent) -> bool {
        let Some(placeholder) = self.items.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if !placeholder.settle(event) {
            return false;
        }

        if let Some(wrapper) = find_wrapper(root, id) {
            wrapper.remove_class(SKELETON_CLASS);
            for node in &mut wrapper.children {
                if let Some(img) = node.as_element_mut().filter(|el| el.is("img")) {
                    img.set_style("opacity", "1");
                }
            }
        }
        true
    }
}

/// Wrap pending images in placeholders.
///
/// Images marked complete are left alone. Wrappers from an earlier run are
/// registered again instead of being nested, so the pass is idempotent.
pub fn wrap_images(fragment: &mut Fragment, min_height: u32) -> PlaceholderSet {
    let mut used = HashSet::new();
    collect_ids(fragment.root(), &mut used);

    let mut wrapper = Wrapper {
        min_height,
        used,
        next: 0,
        set: PlaceholderSet::default(),
    };
    wrapper.walk(fragment.root_mut());
    wrapper.set
}

struct Wrapper {
    min_height: u32,
    used: HashSet<String>,
    next: usize,
    set: PlaceholderSet,
}

impl Wrapper {
    fn walk(&mut self, parent: &mut Element) {
        for node in &mut parent.children {
            let Node::Element(el) = node else {
                continue;
            };

            if is_wrapper(el) {
                self.register_existing(el);
                continue;
            }

            if el.is("img") {
                if el.attr(LOADED_ATTR).is_none() {
                    let img = std::mem::take(el);
                    *el = self.wrap(img);
                }
                continue;
            }

            self.walk(el);
        }
    }

    fn register_existing(&mut self, wrapper: &Element) {
        let Some(id) = wrapper.attr(PLACEHOLDER_ID_ATTR) else {
            return;
        };
        let src = wrapper
            .child_elements()
            .find(|(_, el)| el.is("img"))
            .and_then(|(_, img)| img.attr("src"))
            .map(str::to_owned);
        let mut placeholder = ImagePlaceholder::new(id.to_owned(), src);
        if !wrapper.has_class(SKELETON_CLASS) {
            placeholder.state = ImageState::Loaded;
        }
        self.set.items.push(placeholder);
    }

    fn wrap(&mut self, mut img: Element) -> Element {
        let id = self.next_id();
        img.set_style("opacity", "0");
        img.set_style("transition", IMAGE_TRANSITION);

        let src = img.attr("src").map(str::to_owned);
        self.set.items.push(ImagePlaceholder::new(id.clone(), src));

        let mut wrapper = Element::new("div")
            .with_attr("class", format!("{PLACEHOLDER_CLASS} {SKELETON_CLASS}"))
            .with_attr(PLACEHOLDER_ID_ATTR, id)
            .with_child(img);
        wrapper.set_style("min-height", &format!("{}px", self.min_height));
        wrapper
    }

    fn next_id(&mut self) -> String {
        loop {
            let id = format!("img-{}", self.next);
            self.next += 1;
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn is_wrapper(el: &Element) -> bool {
    el.has_class(PLACEHOLDER_CLASS) && el.attr(PLACEHOLDER_ID_ATTR).is_some()
}

fn collect_ids(parent: &Element, used: &mut HashSet<String>) {
    for (_, el) in parent.child_elements() {
        if let Some(id) = el.attr(PLACEHOLDER_ID_ATTR).filter(|_| is_wrapper(el)) {
            used.insert(id.to_owned());
        }
        collect_ids(el, used);
    }
}

fn find_wrapper<'a>(parent: &'a mut Element, id: &str) -> Option<&'a mut Element> {
    for node in &mut parent.children {
        let Some(el) = node.as_element_mut() else {
            continue;
        };
        if is_wrapper(el) && el.attr(PLACEHOLDER_ID_ATTR) == Some(id) {
            return Some(el);
        }
        if let Some(found) = find_wrapper(el, id) {
            return Some(found);
        }
    }
    None
}
