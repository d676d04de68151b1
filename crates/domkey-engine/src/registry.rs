use parking_lot::Mutex;
use tracing::debug;

/// A key that discovers and clicks an element outside the key config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTrigger {
    /// Key name.
    pub key: String,
    /// Selector for the container, resolved from the document.
    pub container: String,
    /// Candidate selectors tried inside the container; first hit wins.
    pub targets: Vec<String>,
}

/// Triggers keyed by key name. At most one per key; last register wins.
#[derive(Default)]
pub struct TriggerRegistry {
    /// Entries in registration order.
    entries: Mutex<Vec<RegisteredTrigger>>,
}

impl TriggerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the trigger for `key`.
    pub fn register<I, S>(&self, key: &str, container: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let trigger = RegisteredTrigger {
            key: key.to_string(),
            container: container.to_string(),
            targets: targets.into_iter().map(Into::into).collect(),
        };
        debug!(key, container, targets = trigger.targets.len(), "trigger_register");
        let mut entries = self.entries.lock();
        entries.retain(|t| t.key != key);
        entries.push(trigger);
    }

    /// Remove the trigger for `key`. Returns whether one existed.
    pub fn unregister(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|t| t.key != key);
        entries.len() != before
    }

    /// The trigger for `key`.
    pub fn find(&self, key: &str) -> Option<RegisteredTrigger> {
        self.entries.lock().iter().find(|t| t.key == key).cloned()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().iter().map(|t| t.key.clone()).collect()
    }
}
