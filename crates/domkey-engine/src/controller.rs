//! The controller surface and the namespace that publishes controllers by name.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Weak},
};

use config::{Config, FocusId, HotKeyConfig, OperationControl};
use domkey_dom::{Dom, ElementId, MutationCallback, ObserveConfig, ObserverId};
use keybind::{Chord, Filter, KeyBinder, Press, PressHandler};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    ClickBefore, Diagnostics, Error, Listener, ListenerId, NodeHandle, RegisteredTrigger, Result,
    actuator::{Outcome, actuate},
    context::Context,
};

/// Raw press hook. Replaces the default "run the action for this key" handler.
pub type PressedHook = Arc<dyn Fn(&Press, &Controller) + Send + Sync>;

/// Everything a controller is initialized with.
#[derive(Clone, Default)]
pub struct Options {
    /// Declarative configuration.
    pub config: Config,
    /// Raw press hook; when absent each press runs [`Controller::action`].
    pub pressed: Option<PressedHook>,
    /// Press admission predicate handed to the key binder.
    pub filter: Option<Filter>,
    /// Pre-click veto hook.
    pub click_before: Option<ClickBefore>,
    /// Callback for [`Controller::observer`].
    pub observer_callback: Option<MutationCallback>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("config", &self.config)
            .field("pressed", &self.pressed.is_some())
            .field("filter", &self.filter.is_some())
            .field("click_before", &self.click_before.is_some())
            .field("observer_callback", &self.observer_callback.is_some())
            .finish()
    }
}

impl Options {
    /// Options for `config` with no hooks.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the raw press hook.
    pub fn with_pressed(mut self, hook: PressedHook) -> Self {
        self.pressed = Some(hook);
        self
    }

    /// Set the admission filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the pre-click veto hook.
    pub fn with_click_before(mut self, hook: ClickBefore) -> Self {
        self.click_before = Some(hook);
        self
    }

    /// Set the mutation observer callback.
    pub fn with_observer_callback(mut self, callback: MutationCallback) -> Self {
        self.observer_callback = Some(callback);
        self
    }
}

/// A configured shortcut dispatcher bound to one document.
///
/// Cloning is cheap; clones share all session state.
#[derive(Clone)]
pub struct Controller {
    /// Session state.
    ctx: Arc<Context>,
    /// Key binding layer the configured keys are bound through.
    binder: Arc<dyn KeyBinder>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("keys", &self.ctx.config.keys)
            .field("handler", &self.ctx.config.handler)
            .finish_non_exhaustive()
    }
}

/// Build the handler bound for the configured keys.
///
/// Holds weak references only: the binder owns the handler, so a strong
/// reference back to the controller would never be freed.
fn press_handler(
    ctx: Weak<Context>,
    binder: Weak<dyn KeyBinder>,
    pressed: Option<PressedHook>,
) -> PressHandler {
    Arc::new(move |press: &Press| {
        let (Some(ctx), Some(binder)) = (ctx.upgrade(), binder.upgrade()) else {
            return;
        };
        let controller = Controller { ctx, binder };
        if let Some(hook) = &pressed {
            hook(press, &controller);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                let key = press.shortcut.clone();
                rt.spawn(async move {
                    controller.action(&key, None, true).await;
                });
            }
            Err(_) => controller.ctx.diag.warn(format_args!(
                "no async runtime to run the [{}] hot-key",
                press.shortcut
            )),
        }
    })
}

impl Controller {
    /// Validate `options.config` and bind its keys through `binder`.
    ///
    /// The filter is installed only once the keys are bound, so a failed
    /// setup leaves `binder` as it was.
    pub fn new(dom: Arc<dyn Dom>, binder: Arc<dyn KeyBinder>, options: Options) -> Result<Self> {
        let Options {
            config,
            pressed,
            filter,
            click_before,
            observer_callback,
        } = options;
        config.validate()?;
        let combos = config.combos();
        // Nothing touches the binder until every combo parses.
        Chord::parse_list(&combos).map_err(keybind::Error::InvalidChord)?;
        let ctx = Arc::new(Context::new(dom, config, click_before, observer_callback));
        if !combos.is_empty() {
            let handler = press_handler(Arc::downgrade(&ctx), Arc::downgrade(&binder), pressed);
            binder.bind(&combos, handler)?;
        }
        if let Some(filter) = filter {
            binder.set_filter(filter);
        }
        info!(
            keys = ctx.config.keys.len(),
            handler = ctx.config.handler.as_deref().unwrap_or(""),
            "controller_init"
        );
        Ok(Self { ctx, binder })
    }

    /// Run the press pipeline for `key`.
    ///
    /// `callback` hears about every resolved step after the global listeners.
    /// With `poll` false every lookup is a single attempt.
    pub async fn action(&self, key: &str, callback: Option<Listener>, poll: bool) -> Outcome {
        actuate(&self.ctx, key, callback.as_ref(), poll).await
    }

    /// Resolve `selector` from the document root.
    pub async fn find(&self, selector: &str, poll: bool) -> NodeHandle {
        self.node(None).find(selector, true, poll).await
    }

    /// Handle on `el` (or an empty handle).
    pub fn node(&self, el: Option<ElementId>) -> NodeHandle {
        NodeHandle::new(self.ctx.clone(), el)
    }

    /// Register a trigger for `key`: a container and candidate targets inside it.
    pub fn register<I, S>(&self, key: &str, container: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ctx.triggers.register(key, container, targets);
    }

    /// Remove the trigger for `key`.
    pub fn unregister(&self, key: &str) -> bool {
        self.ctx.triggers.unregister(key)
    }

    /// The trigger registered for `key`.
    pub fn trigger(&self, key: &str) -> Option<RegisteredTrigger> {
        self.ctx.triggers.find(key)
    }

    /// Keys with a registered trigger.
    pub fn triggers(&self) -> Vec<String> {
        self.ctx.triggers.keys()
    }

    /// Move the focus marker to `el`.
    pub fn set_focus(&self, el: Option<ElementId>) {
        self.ctx.focus.set_focus(el);
    }

    /// Remove the focus marker everywhere.
    pub fn clear_focus(&self) {
        self.ctx.focus.clear_focus();
    }

    /// Current focus id.
    pub fn focus_id(&self) -> Option<FocusId> {
        self.ctx.focus.focus_id()
    }

    /// Override the focus id (`None` makes the next lookup read the tree). Returns `id`.
    pub fn set_focus_id(&self, id: Option<FocusId>) -> Option<FocusId> {
        self.ctx.focus.set_focus_id(id)
    }

    /// Bind extra combos through the controller's key binder.
    pub fn bind(&self, combos: &str, handler: PressHandler) -> Result<()> {
        Ok(self.binder.bind(combos, handler)?)
    }

    /// Unbind combos. Returns how many handlers were removed.
    pub fn unbind(&self, combos: &str) -> usize {
        self.binder.unbind(combos)
    }

    /// Add a global listener.
    pub fn on(&self, listener: Listener) -> ListenerId {
        self.ctx.listeners.on(listener)
    }

    /// Remove a global listener.
    pub fn off(&self, id: ListenerId) -> bool {
        self.ctx.listeners.off(id)
    }

    /// Attach the configured observer callback below `root` (the document when absent).
    ///
    /// `config` defaults to attributes, child list and subtree.
    pub fn observer(
        &self,
        root: Option<ElementId>,
        config: Option<ObserveConfig>,
    ) -> Result<ObserverId> {
        let callback = self
            .ctx
            .observer_callback
            .clone()
            .ok_or(Error::NoObserverCallback)?;
        let id = self
            .ctx
            .dom
            .observe(root.into(), config.unwrap_or_default(), callback)?;
        debug!(?root, ?id, "observer_attached");
        Ok(id)
    }

    /// The configured observer callback.
    pub fn observer_trigger(&self) -> Option<MutationCallback> {
        self.ctx.observer_callback.clone()
    }

    /// Configured key combos.
    pub fn keys(&self) -> &[String] {
        &self.ctx.config.keys
    }

    /// Per-key operations.
    pub fn hot_key_config(&self) -> &HotKeyConfig {
        &self.ctx.config.hot_key_config
    }

    /// Per-focus permissions.
    pub fn operation_control(&self) -> &OperationControl {
        &self.ctx.config.operation_control
    }

    /// The full configuration.
    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Diagnostics switch for this controller.
    pub fn diagnostics(&self) -> Diagnostics {
        self.ctx.diag
    }
}

/// Controllers published by handler name.
#[derive(Clone, Default)]
pub struct Namespace {
    /// Published controllers.
    entries: Arc<Mutex<BTreeMap<String, Controller>>>,
}

impl Namespace {
    /// Empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a controller and publish it under `options.config.handler`, if set.
    ///
    /// A name that is already taken fails with [`Error::HandlerConflict`]
    /// before any key is bound.
    pub fn initialize(
        &self,
        dom: Arc<dyn Dom>,
        binder: Arc<dyn KeyBinder>,
        options: Options,
    ) -> Result<Controller> {
        let name = options.config.handler.clone();
        if let Some(name) = &name
            && self.entries.lock().contains_key(name)
        {
            return Err(Error::HandlerConflict(name.clone()));
        }
        let controller = Controller::new(dom, binder, options)?;
        let Some(name) = name else {
            return Ok(controller);
        };
        let mut entries = self.entries.lock();
        if entries.contains_key(&name) {
            drop(entries);
            controller.unbind(&controller.config().combos());
            return Err(Error::HandlerConflict(name));
        }
        debug!(handler = %name, "namespace_publish");
        entries.insert(name, controller.clone());
        Ok(controller)
    }

    /// The controller published as `name`.
    pub fn get(&self, name: &str) -> Option<Controller> {
        self.entries.lock().get(name).cloned()
    }

    /// Published names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Withdraw `name`. The controller keeps working for holders of a clone.
    pub fn remove(&self, name: &str) -> Option<Controller> {
        self.entries.lock().remove(name)
    }
}
