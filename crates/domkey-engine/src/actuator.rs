//! The key-press state machine.
//!
//! `Idle -> TriggerCheck -> PermissionCheck -> Resolving(i of N) -> Done`
//!
//! A registered trigger ends the press after its own lookup. Otherwise the
//! permission gate decides, and each operation chain is resolved step by
//! step: step 0 from the document, every later step inside the element the
//! previous step clicked. Listeners hear about step `i` before step `i + 1`
//! starts resolving. A miss ends its chain only.

use std::sync::Arc;

use config::{FocusId, markers};
use domkey_dom::{ElementId, Scope};
use keybind::Chord;
use tracing::{debug, trace};

use crate::{
    Listener, NodeHandle, ResolvedTarget, context::Context, permission::may_act,
    registry::RegisteredTrigger,
};

/// Where a press is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a press.
    Idle,
    /// Looking for a registered trigger.
    TriggerCheck,
    /// Asking the permission gate.
    PermissionCheck,
    /// Resolving step `step` of a chain of `of` steps.
    Resolving {
        /// Zero-based step index.
        step: usize,
        /// Chain length.
        of: usize,
    },
    /// Finished.
    Done,
}

/// How a press ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A registered trigger handled the press (whether or not it found its target).
    Triggered,
    /// The permission gate denied the key.
    Denied,
    /// Operation chains ran; `steps` counts steps resolved across all chains.
    Completed {
        /// Resolved steps.
        steps: usize,
    },
}

/// Direction implied by a key name, for dynamic keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Previous sibling.
    Up,
    /// Next sibling.
    Down,
}

/// `up`/`down` in the final `+` segment of `key`.
fn direction(key: &str) -> Option<Direction> {
    let name = Chord::parse(key).map_or_else(|| key.to_ascii_lowercase(), |c| c.key);
    match name.as_str() {
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}

/// One press, with everything it needs threaded through.
struct Run<'a> {
    /// Controller context.
    ctx: &'a Arc<Context>,
    /// Pressed key name.
    key: &'a str,
    /// Per-call listener.
    callback: Option<&'a Listener>,
    /// Whether lookups poll.
    poll: bool,
}

impl Run<'_> {
    /// Log a phase change.
    fn enter(&self, phase: Phase) {
        trace!(key = self.key, ?phase, "actuator_phase");
    }

    /// Click `el` through a handle and report it as step `index`.
    fn click_and_notify(&self, el: ElementId, index: usize) -> ResolvedTarget {
        let handle = NodeHandle::new(self.ctx.clone(), Some(el));
        handle.click(self.key);
        let target = ResolvedTarget::Handle(handle);
        self.ctx
            .listeners
            .notify(&target, index, self.key, self.callback);
        target
    }

    /// Resolve a registered trigger: container without polling, then candidates in order.
    async fn trigger(&self, trigger: &RegisteredTrigger) {
        let resolver = &self.ctx.resolver;
        let Some(container) = resolver
            .resolve_async(&trigger.container, Scope::Document, false)
            .await
        else {
            self.ctx.diag.warn(format_args!(
                "register hot-key trigger container [{}] not found",
                trigger.container
            ));
            return;
        };
        for candidate in &trigger.targets {
            if let Some(el) = resolver
                .resolve_async(candidate, container.into(), self.poll)
                .await
            {
                self.click_and_notify(el, 0);
                return;
            }
        }
        self.ctx.diag.warn("register hot-key trigger element not found");
    }

    /// Resolve the focus region's dynamic selector inside `base` (the document
    /// when absent) and click it.
    async fn dynamic(
        &self,
        base: Option<ElementId>,
        focus: Option<&FocusId>,
        index: usize,
    ) -> Option<ElementId> {
        let selector = focus
            .and_then(|id| self.ctx.config.operation_control.get(id))
            .and_then(|entry| entry.dynamic_selector_for(self.key));
        let Some(selector) = selector else {
            self.ctx.diag.warn(format_args!(
                "the [{}] hot-key has no dynamic selector for the current focus",
                self.key
            ));
            return None;
        };
        let found = self
            .ctx
            .resolver
            .resolve_async(selector, base.into(), self.poll)
            .await;
        let handle = NodeHandle::new(self.ctx.clone(), found);
        let handle = match direction(self.key) {
            Some(Direction::Up) if !handle.is_empty() => handle.prev(1),
            Some(Direction::Down) if !handle.is_empty() => handle.next(1),
            _ => handle,
        };
        let Some(el) = handle.current() else {
            self.ctx.diag.warn(format_args!(
                "the [{}] hot-key of dynamic trigger element not found",
                self.key
            ));
            return None;
        };
        handle.click(self.key);
        self.ctx
            .listeners
            .notify(&ResolvedTarget::Element(el), index, self.key, self.callback);
        Some(el)
    }

    /// Run one chain. Returns the number of steps resolved.
    async fn chain(&self, chain: &[String], dynamic: bool, focus: Option<&FocusId>) -> usize {
        let mut scope = Scope::Document;
        for (index, selector) in chain.iter().enumerate() {
            self.enter(Phase::Resolving {
                step: index,
                of: chain.len(),
            });
            // A dynamic key only uses its step to narrow the dynamic lookup,
            // which does the polling.
            let found = self
                .ctx
                .resolver
                .resolve_async(selector, scope, self.poll && !dynamic)
                .await;
            let clicked = match (found, dynamic) {
                (found, true) => match self.dynamic(found, focus, index).await {
                    Some(el) => el,
                    None => return index,
                },
                (Some(el), false) => {
                    self.click_and_notify(el, index);
                    el
                }
                (None, false) => {
                    self.ctx
                        .diag
                        .warn(format_args!("not found hot key target of [{selector}]"));
                    return index;
                }
            };
            scope = Scope::Element(clicked);
        }
        chain.len()
    }
}

/// Run the full pipeline for one press of `key`.
pub(crate) async fn actuate(
    ctx: &Arc<Context>,
    key: &str,
    callback: Option<&Listener>,
    poll: bool,
) -> Outcome {
    let press = Run {
        ctx,
        key,
        callback,
        poll,
    };
    press.enter(Phase::Idle);
    ctx.diag.key(key);

    press.enter(Phase::TriggerCheck);
    if let Some(trigger) = ctx.triggers.find(key) {
        press.trigger(&trigger).await;
        press.enter(Phase::Done);
        return Outcome::Triggered;
    }

    press.enter(Phase::PermissionCheck);
    let focus = ctx.focus.focus_id();
    if !may_act(&ctx.config.operation_control, focus.as_ref(), key) {
        debug!(key, focus = ?focus, "press_denied");
        press.enter(Phase::Done);
        return Outcome::Denied;
    }

    let key_config = ctx.config.hot_key_config.get(key);
    let chains = key_config
        .and_then(|kc| kc.operation.as_ref())
        .map_or_else(
            || vec![vec![format!(".{}", markers::FOCUS_CONTAINER)]],
            |op| op.chains(),
        );
    let dynamic = key_config.is_some_and(|kc| kc.dynamic);

    let mut steps = 0;
    for chain in &chains {
        steps += press.chain(chain, dynamic, focus.as_ref()).await;
    }
    press.enter(Phase::Done);
    debug!(key, chains = chains.len(), steps, "press_done");
    Outcome::Completed { steps }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_reads_final_segment() {
        assert_eq!(direction("up"), Some(Direction::Up));
        assert_eq!(direction("ArrowDown"), Some(Direction::Down));
        assert_eq!(direction("shift+up"), Some(Direction::Up));
        assert_eq!(direction("1"), None);
        assert_eq!(direction("upper"), None);
    }
}
