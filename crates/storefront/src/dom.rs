//! Page model consumed by the interceptors.
//!
//! The interceptors never touch a concrete DOM. They see a snapshot of the
//! element that triggered the event ([`Element`]) and mutate the page through
//! the [`Document`] trait. [`MemoryDocument`] is an in-memory page used by
//! the CLI's headless mode and by the tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use tracing::debug;

/// Identifier of a node within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(u64);

impl NodeId {
    /// Identifier of an element that has not been attached to a document.
    pub const DETACHED: Self = Self(0);

    /// Get the underlying value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Snapshot of an element at event time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    node: NodeId,
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    data: BTreeMap<String, String>,
    action: Option<String>,
    fields: Vec<(String, String)>,
}

impl Element {
    /// Create a detached element with the given tag name.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the `id` attribute.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    /// Add a class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set a `data-*` attribute (`name` without the `data-` prefix).
    #[must_use]
    pub fn with_data(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Set the form `action` attribute.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Append a form field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn dom_id(&self) -> Option<&str> {
        self.dom_id.as_deref()
    }

    /// Whether the element carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Value of a `data-*` attribute.
    #[must_use]
    pub fn data(&self, name: &str) -> Option<&str> {
        self.data.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Form fields in document order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// The page the interceptors read from and mutate.
pub trait Document: Send + Sync {
    /// Current cookie string (`name=value; name2=value2`).
    fn cookie_header(&self) -> String;

    /// Replace the contents of the element with the given `id`.
    ///
    /// Returns `false` if no such element exists.
    fn replace_inner_html(&self, container_id: &str, html: &str) -> bool;

    /// Remove the nearest node (starting at `node` itself) carrying `class`.
    ///
    /// Returns `false` if no ancestor carries the class.
    fn remove_closest(&self, node: NodeId, class: &str) -> bool;

    /// Navigate the browser to `location`.
    fn navigate(&self, location: &str);

    /// Current location.
    fn location(&self) -> String;
}

#[derive(Debug)]
struct Node {
    element: Element,
    parent: Option<NodeId>,
    inner_html: String,
}

#[derive(Debug, Default)]
struct PageState {
    next_id: u64,
    nodes: HashMap<NodeId, Node>,
    cookies: String,
    location: String,
}

/// In-memory page.
///
/// Cheaply cloneable; clones share the same page.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    inner: Arc<RwLock<PageState>>,
}

impl MemoryDocument {
    /// Create an empty page at `location` with the given cookie string.
    #[must_use]
    pub fn new(location: impl Into<String>, cookies: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PageState {
                next_id: 0,
                nodes: HashMap::new(),
                cookies: cookies.into(),
                location: location.into(),
            })),
        }
    }

    /// Attach `element` under `parent` (or at the root) and return the
    /// attached snapshot carrying its new [`NodeId`].
    ///
    /// Attaching under a parent that does not exist attaches at the root.
    pub fn append(&self, parent: Option<NodeId>, element: Element) -> Element {
        let Ok(mut state) = self.inner.write() else {
            return element;
        };
        state.next_id += 1;
        let node = NodeId(state.next_id);
        let parent = parent.filter(|p| state.nodes.contains_key(p));
        let element = Element { node, ..element };
        state.nodes.insert(
            node,
            Node {
                element: element.clone(),
                parent,
                inner_html: String::new(),
            },
        );
        element
    }

    /// Replace the cookie string.
    pub fn set_cookies(&self, cookies: impl Into<String>) {
        if let Ok(mut state) = self.inner.write() {
            state.cookies = cookies.into();
        }
    }

    /// Whether `node` is still attached.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.inner
            .read()
            .map(|state| state.nodes.contains_key(&node))
            .unwrap_or(false)
    }

    /// Contents of the element with the given `id`.
    #[must_use]
    pub fn inner_html(&self, dom_id: &str) -> Option<String> {
        let state = self.inner.read().ok()?;
        state
            .nodes
            .values()
            .find(|n| n.element.dom_id() == Some(dom_id))
            .map(|n| n.inner_html.clone())
    }

    /// Number of attached nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map(|state| state.nodes.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageState {
    fn closest(&self, start: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(start);
        while let Some(id) = current {
            let node = self.nodes.get(&id)?;
            if node.element.has_class(class) {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }
}

impl Document for MemoryDocument {
    fn cookie_header(&self) -> String {
        self.inner
            .read()
            .map(|state| state.cookies.clone())
            .unwrap_or_default()
    }

    fn replace_inner_html(&self, container_id: &str, html: &str) -> bool {
        let Ok(mut state) = self.inner.write() else {
            return false;
        };
        let Some(node) = state
            .nodes
            .values_mut()
            .find(|n| n.element.dom_id() == Some(container_id))
        else {
            return false;
        };
        node.inner_html = html.to_string();
        debug!(container_id, bytes = html.len(), "Replaced container contents");
        true
    }

    fn remove_closest(&self, node: NodeId, class: &str) -> bool {
        let Ok(mut state) = self.inner.write() else {
            return false;
        };
        let Some(target) = state.closest(node, class) else {
            return false;
        };
        let doomed: Vec<NodeId> = state
            .nodes
            .keys()
            .copied()
            .filter(|&id| state.is_descendant(id, target))
            .collect();
        for id in &doomed {
            state.nodes.remove(id);
        }
        debug!(node = target.as_u64(), removed = doomed.len(), "Removed node");
        true
    }

    fn navigate(&self, location: &str) {
        if let Ok(mut state) = self.inner.write() {
            debug!(location, "Navigating");
            state.location = location.to_string();
        }
    }

    fn location(&self) -> String {
        self.inner
            .read()
            .map(|state| state.location.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_page() -> (MemoryDocument, Element, Element) {
        let doc = MemoryDocument::new("/rental/cart/", "csrftoken=abc");
        let list = doc.append(None, Element::new("ul").with_id("cart-items"));
        let item = doc.append(
            Some(list.node()),
            Element::new("li").with_class("cart-item"),
        );
        let button = doc.append(
            Some(item.node()),
            Element::new("button")
                .with_class("remove-ajax")
                .with_data("id", "7"),
        );
        (doc, item, button)
    }

    #[test]
    fn test_append_assigns_ids() {
        let (doc, item, button) = cart_page();
        assert_ne!(item.node(), NodeId::DETACHED);
        assert_ne!(item.node(), button.node());
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_remove_closest_removes_subtree() {
        let (doc, item, button) = cart_page();
        assert!(doc.remove_closest(button.node(), "cart-item"));
        assert!(!doc.contains(item.node()));
        assert!(!doc.contains(button.node()));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_remove_closest_matches_self() {
        let (doc, item, _) = cart_page();
        assert!(doc.remove_closest(item.node(), "cart-item"));
        assert!(!doc.contains(item.node()));
    }

    #[test]
    fn test_remove_closest_without_match() {
        let (doc, _, button) = cart_page();
        assert!(!doc.remove_closest(button.node(), "order-row"));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_replace_inner_html() {
        let (doc, _, _) = cart_page();
        assert!(doc.replace_inner_html("cart-items", "<li>Helmet</li>"));
        assert_eq!(doc.inner_html("cart-items").as_deref(), Some("<li>Helmet</li>"));
        assert!(!doc.replace_inner_html("missing", "<li/>"));
    }

    #[test]
    fn test_navigate_and_cookies() {
        let (doc, _, _) = cart_page();
        doc.navigate("/rental/checkout/1/success/");
        assert_eq!(doc.location(), "/rental/checkout/1/success/");
        doc.set_cookies("csrftoken=rotated");
        assert_eq!(doc.cookie_header(), "csrftoken=rotated");
    }

    #[test]
    fn test_element_accessors() {
        let form = Element::new("form")
            .with_class("ajax-add-to-cart")
            .with_action("/rental/cart/add/3/")
            .with_field("quantity", "1")
            .with_field("days", "2");
        assert!(form.has_class("ajax-add-to-cart"));
        assert!(!form.has_class("ajax"));
        assert_eq!(form.action(), Some("/rental/cart/add/3/"));
        assert_eq!(form.fields().len(), 2);
        assert_eq!(form.data("id"), None);
    }
}
