//! domkey engine
//!
//! Declarative keyboard shortcuts for a document tree. A [`Controller`] binds
//! configured keys and, on every press, runs the press pipeline:
//! - a registered trigger for the key, if any, handles the press on its own
//! - otherwise the permission gate checks the key against the focus region
//! - each operation chain is resolved step by step through the selector
//!   micro-language, polling for elements that have not rendered yet
//! - every resolved element is clicked (subject to the veto hook) and
//!   listeners are told about it before the next step starts
//!
//! The document is reached only through [`domkey_dom::Dom`]; keys are bound
//! only through [`keybind::KeyBinder`].
//!
//! Misses and denials never surface as errors. They are logged at debug level
//! and, when `log` is enabled in the config, reported through [`Diagnostics`].

mod actuator;
mod context;
mod controller;
mod diagnostics;
mod error;
mod focus;
mod listener;
mod node;
mod permission;
mod poll;
mod registry;
pub mod selector;

pub use actuator::{Outcome, Phase};
pub use controller::{Controller, Namespace, Options, PressedHook};
pub use diagnostics::{Diagnostics, TARGET as DIAGNOSTICS_TARGET};
pub use error::{Error, Result};
pub use focus::FocusTracker;
pub use listener::{Listener, ListenerId, ListenerRegistry, ResolvedTarget};
pub use node::{ClickBefore, NodeHandle};
pub use permission::may_act;
pub use poll::Resolver;
pub use registry::{RegisteredTrigger, TriggerRegistry};

pub use config::{Config, FocusId};
pub use domkey_dom::{Dom, ElementId, ObserveConfig, Scope};
