//! Document tree contract used by the domkey engine.
//!
//! The engine never touches a concrete tree. Everything it needs from the host
//! document is expressed by the [`Dom`] trait:
//! - scoped selector queries (`query_all` / `query`)
//! - element text, classes and sibling navigation
//! - click dispatch
//! - subtree mutation observation
//!
//! [`MemDom`] is a small arena-backed implementation used by tests and the
//! `domkey` CLI. It understands the subset of CSS listed in [`MemDom`]'s docs.

use std::{fmt, sync::Arc};

mod css;
mod error;
mod mem;

pub use error::{DomError, Result};
pub use mem::{ElementSpec, MemDom};

/// Opaque handle to an element owned by a [`Dom`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Root of a query: the whole document or the subtree below one element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Search every element in the document.
    #[default]
    Document,
    /// Search descendants of the given element (the element itself excluded).
    Element(ElementId),
}

impl From<ElementId> for Scope {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<Option<ElementId>> for Scope {
    fn from(id: Option<ElementId>) -> Self {
        id.map_or(Self::Document, Self::Element)
    }
}

/// Which mutations an observer wants to hear about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserveConfig {
    /// Class and attribute changes.
    pub attributes: bool,
    /// Children inserted, removed or replaced (including text replacement).
    pub child_list: bool,
    /// Also report mutations anywhere below the observed target.
    pub subtree: bool,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            attributes: true,
            child_list: true,
            subtree: true,
        }
    }
}

/// Kind of change carried by a [`MutationRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    /// Children of the target changed.
    ChildList,
    /// An attribute of the target changed.
    Attributes {
        /// Attribute name (`class` for class list changes).
        name: String,
    },
}

/// A single observed change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    /// Node whose children or attributes changed.
    pub target: Scope,
    /// What changed.
    pub kind: MutationKind,
}

/// Callback invoked with each batch of mutation records.
pub type MutationCallback = Arc<dyn Fn(&[MutationRecord]) + Send + Sync>;

/// Registration handle returned by [`Dom::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Contract the engine requires from the host document.
///
/// Implementations must not call back into the engine while holding internal
/// locks; click handlers and mutation callbacks may re-enter the tree.
pub trait Dom: Send + Sync {
    /// All elements below `scope` matching `selector`, in document order.
    fn query_all(&self, scope: Scope, selector: &str) -> Result<Vec<ElementId>>;

    /// First element below `scope` matching `selector`.
    fn query(&self, scope: Scope, selector: &str) -> Result<Option<ElementId>> {
        Ok(self.query_all(scope, selector)?.into_iter().next())
    }

    /// Concatenated text of the element and its descendants.
    fn text_content(&self, el: ElementId) -> Option<String>;

    /// Dispatch a click on the element.
    fn click(&self, el: ElementId);

    /// Class names currently on the element.
    fn class_list(&self, el: ElementId) -> Vec<String>;

    /// Whether the element carries `class`.
    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.class_list(el).iter().any(|c| c == class)
    }

    /// Add `class` to the element (no-op when present).
    fn add_class(&self, el: ElementId, class: &str);

    /// Remove `class` from the element (no-op when absent).
    fn remove_class(&self, el: ElementId, class: &str);

    /// Next element sibling.
    fn next_sibling(&self, el: ElementId) -> Option<ElementId>;

    /// Previous element sibling.
    fn prev_sibling(&self, el: ElementId) -> Option<ElementId>;

    /// Attach a mutation observer to `target`.
    fn observe(
        &self,
        target: Scope,
        config: ObserveConfig,
        callback: MutationCallback,
    ) -> Result<ObserverId>;

    /// Detach an observer. Returns false when the id is unknown.
    fn disconnect(&self, id: ObserverId) -> bool;
}
