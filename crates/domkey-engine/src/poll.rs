//! Bounded polling on top of the selector resolver.

use std::sync::Arc;

use config::PollSettings;
use domkey_dom::{Dom, ElementId, Scope};
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::{Diagnostics, selector};

/// Resolves selector expressions against one document, optionally polling
/// for elements that have not rendered yet.
#[derive(Clone)]
pub struct Resolver {
    /// Document queried on every attempt.
    dom: Arc<dyn Dom>,
    /// Delay and retry ceiling.
    settings: PollSettings,
    /// Reports invalid expressions.
    diag: Diagnostics,
}

impl Resolver {
    /// Create a resolver for `dom`.
    pub fn new(dom: Arc<dyn Dom>, settings: PollSettings, diag: Diagnostics) -> Self {
        Self {
            dom,
            settings,
            diag,
        }
    }

    /// Polling settings in effect.
    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Parse `expr`, reporting invalid expressions as a diagnostic.
    fn parse(&self, expr: &str) -> Option<Vec<selector::SelectorStep>> {
        match selector::parse(expr) {
            Ok(steps) => Some(steps),
            Err(e) => {
                self.diag.warn(format_args!("invalid selector '{expr}': {e}"));
                None
            }
        }
    }

    /// Resolve once, without waiting.
    pub fn resolve(&self, expr: &str, scope: Scope) -> Option<ElementId> {
        let steps = self.parse(expr)?;
        selector::resolve_steps(self.dom.as_ref(), &steps, scope)
    }

    /// Resolve `expr`, retrying after a delay while nothing matches and `poll` is set.
    ///
    /// The first attempt is immediate. With `poll` false a miss is final;
    /// otherwise up to `max_attempts` further attempts follow, one at a time,
    /// each after `delay`. Exhausting the retries yields `None`.
    pub async fn resolve_async(&self, expr: &str, scope: Scope, poll: bool) -> Option<ElementId> {
        let steps = self.parse(expr)?;
        let mut retries = 0u32;
        loop {
            if let Some(el) = selector::resolve_steps(self.dom.as_ref(), &steps, scope) {
                trace!(expr, retries, %el, "resolve_hit");
                return Some(el);
            }
            if !poll || retries >= self.settings.max_attempts {
                debug!(expr, retries, poll, "resolve_miss");
                return None;
            }
            retries += 1;
            sleep(self.settings.delay()).await;
        }
    }
}
