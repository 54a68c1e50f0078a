use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::ValidationError;

/// Where a deadline is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineMode {
    /// One deadline measured from the first receive attempt.
    #[default]
    Absolute,
    /// A fresh deadline for every receive attempt.
    PerReceive,
}

/// Timeout guard configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeadlineConfig {
    /// Time, in milliseconds, allowed before the guard reports a timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Whether the deadline is fixed or re-armed on each receive.
    #[serde(default)]
    pub mode: DeadlineMode,
}

impl DeadlineConfig {
    /// Default timeout, matching the lesson's five second conversation.
    pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

    /// Returns the configured timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates deadline settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "deadline.timeout_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            mode: DeadlineMode::default(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DeadlineConfig::DEFAULT_TIMEOUT_MS
}
