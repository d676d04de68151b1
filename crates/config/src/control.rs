use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    result::Result as StdResult,
};

use serde::{
    Deserialize, Deserializer,
    de::{self, Visitor},
};

use crate::{Error, Result};

/// Permission table keyed by focus id.
pub type OperationControl = BTreeMap<FocusId, PermissionEntry>;

/// Sentinel string meaning "every key".
const ALL: &str = "ALL";

/// Identifier of a focus region. Page authors use strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FocusId(String);

impl FocusId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FocusId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FocusId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for FocusId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<i64> for FocusId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<i32> for FocusId {
    fn from(n: i32) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for FocusId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> StdResult<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = FocusId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a focus id string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> StdResult<FocusId, E> {
                Ok(FocusId::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> StdResult<FocusId, E> {
                Ok(FocusId::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> StdResult<FocusId, E> {
                Ok(FocusId::from(v))
            }
        }

        d.deserialize_any(IdVisitor)
    }
}

/// Which keys a focus region allows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawControl")]
pub enum Control {
    /// `"ALL"`: every key.
    All,
    /// Only the listed key names.
    Keys(BTreeSet<String>),
    /// Any other string. Denies every key.
    Unknown(String),
}

/// Wire shape of [`Control`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RawControl {
    /// A bare string.
    Text(String),
    /// A list of key names.
    List(Vec<String>),
}

impl From<RawControl> for Control {
    fn from(raw: RawControl) -> Self {
        match raw {
            RawControl::Text(s) if s == ALL => Self::All,
            RawControl::Text(s) => Self::Unknown(s),
            RawControl::List(keys) => Self::Keys(keys.into_iter().collect()),
        }
    }
}

impl Control {
    /// Build an allow-list.
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// Whether `key` may act under this rule.
    pub fn allows(&self, key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Keys(keys) => keys.contains(key),
            Self::Unknown(_) => false,
        }
    }
}

/// Permission rules and dynamic selectors for one focus region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PermissionEntry {
    /// Allowed keys. Missing denies everything.
    pub control: Option<Control>,
    /// Selector per key (or comma-separated key list) for dynamic keys.
    pub dynamic_selector: BTreeMap<String, String>,
}

impl PermissionEntry {
    /// Entry allowing every key.
    pub fn all() -> Self {
        Self {
            control: Some(Control::All),
            ..Self::default()
        }
    }

    /// Add a dynamic selector for `keys`.
    pub fn with_dynamic(mut self, keys: impl Into<String>, selector: impl Into<String>) -> Self {
        self.dynamic_selector.insert(keys.into(), selector.into());
        self
    }

    /// Dynamic selector for `key`.
    ///
    /// An exact entry wins; otherwise the first entry whose comma-separated
    /// key list names `key`.
    pub fn dynamic_selector_for(&self, key: &str) -> Option<&str> {
        if let Some(sel) = self.dynamic_selector.get(key) {
            return Some(sel.as_str());
        }
        self.dynamic_selector
            .iter()
            .find(|(names, _)| names.split(',').any(|n| n.trim() == key))
            .map(|(_, sel)| sel.as_str())
    }

    /// Check this entry; `id` is used in error messages.
    pub(crate) fn validate(&self, id: &FocusId) -> Result<()> {
        if let Some(Control::Unknown(s)) = &self.control {
            tracing::warn!(focus = %id, control = %s, "control value denies every key");
        }
        for (keys, sel) in &self.dynamic_selector {
            if keys.trim().is_empty() || sel.trim().is_empty() {
                return Err(Error::validation(format!(
                    "operationControl '{id}' has an empty dynamicSelector entry"
                )));
            }
        }
        Ok(())
    }
}
