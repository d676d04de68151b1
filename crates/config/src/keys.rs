use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{Error, Result};

/// Per-key configuration, keyed by key name.
pub type HotKeyConfig = BTreeMap<String, KeyConfig>;

/// What a single key does when pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfig {
    /// Free text shown in diagnostics.
    pub describe: Option<String>,
    /// Selector steps to resolve and click. Absent means "the focus container".
    pub operation: Option<Operation>,
    /// Resolve the target through the focus region's dynamic selector table.
    pub dynamic: bool,
}

impl KeyConfig {
    /// Check this entry; `key` is used in error messages.
    pub(crate) fn validate(&self, key: &str) -> Result<()> {
        let Some(op) = &self.operation else {
            return Ok(());
        };
        let chains = op.chains();
        if chains.is_empty() {
            return Err(Error::validation(format!("key '{key}' has an empty operation")));
        }
        for (i, chain) in chains.iter().enumerate() {
            if chain.is_empty() {
                return Err(Error::validation(format!(
                    "key '{key}' operation chain {i} is empty"
                )));
            }
            if let Some(step) = chain.iter().position(|s| s.trim().is_empty()) {
                return Err(Error::validation(format!(
                    "key '{key}' operation chain {i} step {step} has an empty selector"
                )));
            }
        }
        Ok(())
    }
}

/// Selector steps for a key: one chain, or several independent chains.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Operation {
    /// A single chain: `[".a", ".b"]`.
    Chain(Vec<String>),
    /// Several chains run in order: `[[".a"], [".b", ".c"]]`.
    Chains(Vec<Vec<String>>),
}

impl Operation {
    /// Normalize to a list of chains.
    pub fn chains(&self) -> Vec<Vec<String>> {
        match self {
            Self::Chain(steps) => vec![steps.clone()],
            Self::Chains(chains) => chains.clone(),
        }
    }

    /// Every selector in every chain, in declared order.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        let (one, many): (Option<&Vec<String>>, Option<&Vec<Vec<String>>>) = match self {
            Self::Chain(steps) => (Some(steps), None),
            Self::Chains(chains) => (None, Some(chains)),
        };
        one.into_iter()
            .flatten()
            .chain(many.into_iter().flatten().flatten())
            .map(String::as_str)
    }
}

impl From<Vec<String>> for Operation {
    fn from(steps: Vec<String>) -> Self {
        Self::Chain(steps)
    }
}
