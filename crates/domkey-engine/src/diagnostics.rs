//! Page-author diagnostics.
//!
//! These are the messages a page author turns on with `log: true`: the key
//! echo for every press and warnings about targets that could not be found.
//! They are emitted under the `domkey` target so they can be filtered apart
//! from engine internals.

use std::fmt::Display;

use tracing::{info, warn};

/// Target used for every diagnostic event.
pub const TARGET: &str = "domkey";

/// Per-controller diagnostic switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Whether messages are emitted at all.
    enabled: bool,
}

impl Diagnostics {
    /// Diagnostics that emit only when `enabled`.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether diagnostics are on.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Echo a pressed key.
    pub fn key(&self, key: &str) {
        if self.enabled {
            info!(target: TARGET, key, "[hot-key]: {}", key);
        }
    }

    /// Report a recoverable problem (missing target, unresolved focus, ...).
    pub fn warn(&self, message: impl Display) {
        if self.enabled {
            warn!(target: TARGET, "[hot-key-warning]: {}", message);
        }
    }

    /// Informational note.
    pub fn note(&self, message: impl Display) {
        if self.enabled {
            info!(target: TARGET, "[hot-key]: {}", message);
        }
    }
}
