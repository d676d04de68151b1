//! Declarative configuration consumed by domkey controllers.
//!
//! A [`Config`] names the key combos to bind, what each key does
//! ([`HotKeyConfig`]), which keys each focus region permits
//! ([`OperationControl`]) and how long element lookups may poll
//! ([`PollSettings`]). Configs are plain serde data and load from JSON or RON.

use std::result::Result as StdResult;

use serde::Deserialize;

mod control;
mod error;
mod keys;
mod loader;
pub mod markers;
mod polling;

#[cfg(test)]
mod test_parse;
#[cfg(test)]
mod test_validate;

pub use control::{Control, FocusId, OperationControl, PermissionEntry};
pub use error::{Error, excerpt_at};
pub use keys::{HotKeyConfig, KeyConfig, Operation};
pub use loader::{Format, load_from_path, load_from_str};
pub use polling::PollSettings;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    /// Key combos bound at initialization (e.g. `"1"`, `"ctrl+k"`).
    pub keys: Vec<String>,
    /// Emit page-author diagnostics.
    pub log: bool,
    /// Name under which the controller is published, if any.
    pub handler: Option<String>,
    /// What each key does.
    pub hot_key_config: HotKeyConfig,
    /// Which keys each focus region permits.
    pub operation_control: OperationControl,
    /// Polling behaviour for element lookups.
    pub polling: PollSettings,
}

impl Config {
    /// Comma-separated combo list suitable for a key binder.
    pub fn combos(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Operation for `key`, if one is configured.
    pub fn operation(&self, key: &str) -> Option<&Operation> {
        self.hot_key_config.get(key)?.operation.as_ref()
    }

    /// Check structural invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if let Some(k) = self.keys.iter().find(|k| k.trim().is_empty()) {
            return Err(Error::validation(format!("empty key combo in keys: {k:?}")));
        }
        if self.handler.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err(Error::validation("handler name must not be empty"));
        }
        for (key, kc) in &self.hot_key_config {
            if key.trim().is_empty() {
                return Err(Error::validation("hotKeyConfig has an empty key name"));
            }
            kc.validate(key)?;
            if kc.dynamic
                && !self
                    .operation_control
                    .values()
                    .any(|entry| entry.dynamic_selector_for(key).is_some())
            {
                return Err(Error::validation(format!(
                    "key '{key}' is dynamic but no operationControl entry has a dynamicSelector for it"
                )));
            }
        }
        for (id, entry) in &self.operation_control {
            entry.validate(id)?;
        }
        self.polling.validate()
    }
}
