use std::sync::Arc;

use config::Config;
use domkey_dom::{Dom, MutationCallback};

use crate::{
    ClickBefore, Diagnostics, FocusTracker, ListenerRegistry, Resolver, TriggerRegistry,
};

/// Session state owned by one controller.
///
/// Everything a key press touches hangs off this struct; nothing is shared
/// between controllers unless the host shares the document.
pub(crate) struct Context {
    /// Host document.
    pub(crate) dom: Arc<dyn Dom>,
    /// Immutable configuration.
    pub(crate) config: Config,
    /// Selector resolution with polling.
    pub(crate) resolver: Resolver,
    /// Focus marker and focus id.
    pub(crate) focus: FocusTracker,
    /// Registered triggers.
    pub(crate) triggers: TriggerRegistry,
    /// Global listeners.
    pub(crate) listeners: ListenerRegistry,
    /// Pre-click veto hook.
    pub(crate) click_before: Option<ClickBefore>,
    /// Callback for `observer` registrations.
    pub(crate) observer_callback: Option<MutationCallback>,
    /// Page-author diagnostics.
    pub(crate) diag: Diagnostics,
}

impl Context {
    /// Build a context around `dom` for `config`.
    pub(crate) fn new(
        dom: Arc<dyn Dom>,
        config: Config,
        click_before: Option<ClickBefore>,
        observer_callback: Option<MutationCallback>,
    ) -> Self {
        let diag = Diagnostics::new(config.log);
        Self {
            resolver: Resolver::new(dom.clone(), config.polling, diag),
            focus: FocusTracker::new(dom.clone(), diag),
            triggers: TriggerRegistry::new(),
            listeners: ListenerRegistry::new(),
            dom,
            config,
            click_before,
            observer_callback,
            diag,
        }
    }
}
