use std::{fmt, sync::Arc};

use domkey_dom::{ElementId, Scope};
use tracing::trace;

use crate::context::Context;

/// Pre-click hook: `(key, handle)`. Returning true suppresses the click.
pub type ClickBefore = Arc<dyn Fn(&str, &NodeHandle) -> bool + Send + Sync>;

/// Chainable handle around a resolved element (or nothing).
///
/// Handles are cheap to clone. Navigation returns new handles; the original
/// is never changed.
#[derive(Clone)]
pub struct NodeHandle {
    /// Controller context used for further lookups.
    ctx: Arc<Context>,
    /// Resolved element.
    current: Option<ElementId>,
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl NodeHandle {
    /// Wrap `current`.
    pub(crate) fn new(ctx: Arc<Context>, current: Option<ElementId>) -> Self {
        Self { ctx, current }
    }

    /// A handle on another element sharing this handle's context.
    fn with(&self, current: Option<ElementId>) -> Self {
        Self::new(self.ctx.clone(), current)
    }

    /// The wrapped element.
    pub fn current(&self) -> Option<ElementId> {
        self.current
    }

    /// Whether the handle wraps nothing.
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Click the element for `key` unless the pre-click hook vetoes it.
    ///
    /// Returns whether a click was dispatched.
    pub fn click(&self, key: &str) -> bool {
        let Some(el) = self.current else {
            return false;
        };
        if let Some(hook) = &self.ctx.click_before
            && hook(key, self)
        {
            trace!(key, %el, "click_vetoed");
            return false;
        }
        trace!(key, %el, "click");
        self.ctx.dom.click(el);
        true
    }

    /// Resolve `selector` inside this element, or from the document when the
    /// handle is empty or `is_new` is set.
    pub async fn find(&self, selector: &str, is_new: bool, poll: bool) -> Self {
        let scope = match self.current {
            Some(el) if !is_new => Scope::Element(el),
            _ => Scope::Document,
        };
        let found = self.ctx.resolver.resolve_async(selector, scope, poll).await;
        self.with(found)
    }

    /// Step `n` element siblings in one direction. Running out of siblings
    /// yields an empty handle.
    fn walk(&self, n: usize, forward: bool) -> Self {
        let mut cursor = self.current;
        let dom = &self.ctx.dom;
        for _ in 0..n {
            cursor = cursor.and_then(|el| {
                if forward {
                    dom.next_sibling(el)
                } else {
                    dom.prev_sibling(el)
                }
            });
            if cursor.is_none() {
                let dir = if forward { "next" } else { "prev" };
                self.ctx
                    .diag
                    .warn(format_args!("{dir}: sibling element is not found"));
                break;
            }
        }
        self.with(cursor)
    }

    /// Handle on the `n`th next element sibling.
    pub fn next(&self, n: usize) -> Self {
        self.walk(n, true)
    }

    /// Handle on the `n`th previous element sibling.
    pub fn prev(&self, n: usize) -> Self {
        self.walk(n, false)
    }

    /// Make this element the focus container.
    pub fn set_focus(&self) {
        self.ctx.focus.set_focus(self.current);
    }

    /// Remove the focus marker everywhere.
    pub fn clear_focus(&self) {
        self.ctx.focus.clear_focus();
    }
}
