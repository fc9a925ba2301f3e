//! Delegated event bindings.
//!
//! A binding says "run handler H for events of kind T whose target matches
//! predicate P". Matching happens at dispatch time, so elements added after
//! a binding was registered are handled too.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dom::Element;

/// Kind of user-generated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Form submission.
    Submit,
    /// Click on an element.
    Click,
}

/// Predicate over the event target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Target carries the class.
    Class(String),
    /// Target carries the `data-*` attribute (name without the prefix).
    DataAttribute(String),
}

impl Matcher {
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Class(class) => element.has_class(class),
            Self::DataAttribute(name) => element.data(name).is_some(),
        }
    }
}

/// A dispatched event.
///
/// Clones share the `default_prevented` flag.
#[derive(Debug, Clone)]
pub struct DomEvent {
    kind: EventKind,
    target: Element,
    default_prevented: Arc<AtomicBool>,
}

impl DomEvent {
    #[must_use]
    pub fn new(kind: EventKind, target: Element) -> Self {
        Self {
            kind,
            target,
            default_prevented: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Form submission on `form`.
    #[must_use]
    pub fn submit(form: Element) -> Self {
        Self::new(EventKind::Submit, form)
    }

    /// Click on `element`.
    #[must_use]
    pub fn click(element: Element) -> Self {
        Self::new(EventKind::Click, element)
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub const fn target(&self) -> &Element {
        &self.target
    }

    /// Suppress the browser's default navigation or submission.
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

/// Handles a dispatched event.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: DomEvent) -> BoxFuture<'static, ()>;
}

struct Binding {
    kind: EventKind,
    matcher: Matcher,
    handler: Arc<dyn EventHandler>,
}

/// Registry of delegated bindings.
#[derive(Default)]
pub struct Dispatcher {
    bindings: Vec<Binding>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` for events of `kind` whose target matches `matcher`.
    pub fn bind(&mut self, kind: EventKind, matcher: Matcher, handler: Arc<dyn EventHandler>) {
        self.bindings.push(Binding {
            kind,
            matcher,
            handler,
        });
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Dispatch `event` to every matching binding.
    ///
    /// The default action is prevented as soon as one binding matches. Each
    /// handler runs as its own task, so a slow response never blocks another
    /// handler. Must be called within a Tokio runtime.
    pub fn dispatch(&self, event: &DomEvent) -> Vec<JoinHandle<()>> {
        let handles: Vec<_> = self
            .bindings
            .iter()
            .filter(|b| b.kind == event.kind() && b.matcher.matches(event.target()))
            .map(|b| {
                event.prevent_default();
                tokio::spawn(b.handler.handle(event.clone()))
            })
            .collect();

        debug!(
            kind = ?event.kind(),
            tag = event.target().tag(),
            handlers = handles.len(),
            "Dispatched event"
        );

        handles
    }
}
