use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Bounded retry settings for element lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PollSettings {
    /// Delay between attempts, in milliseconds.
    pub delay_ms: u64,
    /// Retries after the first attempt.
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            delay_ms: 10,
            max_attempts: 60,
        }
    }
}

impl PollSettings {
    /// Delay between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Reject settings that would spin without waiting.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.delay_ms == 0 {
            return Err(Error::validation("polling.delayMs must be greater than zero"));
        }
        Ok(())
    }
}
