//! Focus region tracking.
//!
//! The focused region is the one element carrying the
//! [`markers::FOCUS_CONTAINER`] class. Its focus id is either set explicitly
//! or read from a `hot-key-id=<id>` class on the container or on its first
//! marked descendant.

use std::sync::Arc;

use config::{FocusId, markers};
use domkey_dom::{Dom, ElementId, Scope};
use parking_lot::Mutex;
use tracing::debug;

use crate::Diagnostics;

/// `.hot-key-focus-container`
fn container_selector() -> String {
    format!(".{}", markers::FOCUS_CONTAINER)
}

/// Owns the focus-container marker and the current focus id.
pub struct FocusTracker {
    /// Document carrying the marker.
    dom: Arc<dyn Dom>,
    /// Explicit or cached focus id.
    id: Mutex<Option<FocusId>>,
    /// Reports unresolvable focus.
    diag: Diagnostics,
}

impl FocusTracker {
    /// Track focus in `dom`.
    pub fn new(dom: Arc<dyn Dom>, diag: Diagnostics) -> Self {
        Self {
            dom,
            id: Mutex::new(None),
            diag,
        }
    }

    /// Every element currently carrying the marker.
    fn holders(&self) -> Vec<ElementId> {
        self.dom
            .query_all(Scope::Document, &container_selector())
            .unwrap_or_default()
    }

    /// Move the marker to `target`. With no target the marker is left alone.
    pub fn set_focus(&self, target: Option<ElementId>) {
        let Some(target) = target else {
            self.diag.warn("the set focus container element is not found");
            return;
        };
        for holder in self.holders() {
            if holder != target {
                self.dom.remove_class(holder, markers::FOCUS_CONTAINER);
            }
        }
        self.dom.add_class(target, markers::FOCUS_CONTAINER);
        debug!(%target, "focus_set");
    }

    /// Remove the marker from every element carrying it.
    pub fn clear_focus(&self) {
        for holder in self.holders() {
            self.dom.remove_class(holder, markers::FOCUS_CONTAINER);
        }
        self.diag.note("the focus container is clear");
    }

    /// Set or clear the explicit focus id. Clearing makes the next lookup read the tree.
    pub fn set_focus_id(&self, id: Option<FocusId>) -> Option<FocusId> {
        debug!(id = ?id, "focus_id_set");
        *self.id.lock() = id.clone();
        id
    }

    /// Id carried by `el`'s own classes.
    fn id_on(&self, el: ElementId) -> Option<FocusId> {
        self.dom
            .class_list(el)
            .iter()
            .find_map(|c| markers::id_from_class(c))
            .map(FocusId::from)
    }

    /// Current focus id: the explicit or cached one, else read from the tree and cached.
    pub fn focus_id(&self) -> Option<FocusId> {
        if let Some(id) = self.id.lock().clone() {
            return Some(id);
        }
        let Ok(Some(container)) = self.dom.query(Scope::Document, &container_selector()) else {
            self.diag.warn("the focus container is not found");
            return None;
        };
        let id = self.id_on(container).or_else(|| {
            self.dom
                .query_all(container.into(), &format!(".{}", markers::ID_MARKER))
                .unwrap_or_default()
                .into_iter()
                .find_map(|el| self.id_on(el))
        });
        match id {
            Some(id) => {
                debug!(%id, %container, "focus_id_derived");
                *self.id.lock() = Some(id.clone());
                Some(id)
            }
            None => {
                self.diag.warn("no bound hot-key id under the focus container");
                None
            }
        }
    }
}
