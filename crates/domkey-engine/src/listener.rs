use std::{
    ptr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use domkey_dom::ElementId;
use parking_lot::Mutex;

use crate::NodeHandle;

/// What a resolved step produced.
#[derive(Clone, Debug)]
pub enum ResolvedTarget {
    /// A bare element (dynamic selector resolution).
    Element(ElementId),
    /// A handle that can keep navigating from the element.
    Handle(NodeHandle),
}

impl ResolvedTarget {
    /// The element behind this target.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::Element(el) => Some(*el),
            Self::Handle(h) => h.current(),
        }
    }
}

/// Observer called after each resolved step with `(target, step index, key)`.
pub type Listener = Arc<dyn Fn(&ResolvedTarget, usize, &str) + Send + Sync>;

/// Handle returned by [`ListenerRegistry::on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Global listeners of one controller.
#[derive(Default)]
pub struct ListenerRegistry {
    /// Listeners in registration order.
    entries: Mutex<Vec<(ListenerId, Listener)>>,
    /// Next id to hand out.
    next: AtomicU64,
}

impl ListenerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Adding the same `Arc` again returns its existing id.
    pub fn on(&self, listener: Listener) -> ListenerId {
        let mut entries = self.entries.lock();
        if let Some((id, _)) = entries
            .iter()
            .find(|(_, l)| ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(&listener)))
        {
            return *id;
        }
        let id = ListenerId(self.next.fetch_add(1, Ordering::Relaxed));
        entries.push((id, listener));
        id
    }

    /// Remove a listener. Returns false when it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(i, _)| *i != id);
        entries.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every listener, then `callback`.
    pub fn notify(
        &self,
        target: &ResolvedTarget,
        index: usize,
        key: &str,
        callback: Option<&Listener>,
    ) {
        let listeners: Vec<Listener> = self.entries.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners.iter().chain(callback) {
            listener(target, index, key);
        }
    }
}
