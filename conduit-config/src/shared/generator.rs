use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::ValidationError;

/// Delay a generator waits between an acknowledgment and its next emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CadenceConfig {
    /// Waits the same delay after every acknowledgment. Zero emits immediately.
    Fixed {
        #[serde(default)]
        delay_ms: u64,
    },
    /// Waits a uniformly random delay in `[0, max_delay_ms)`.
    Random { max_delay_ms: u64 },
}

impl CadenceConfig {
    /// Default upper bound for random cadences.
    pub const DEFAULT_MAX_DELAY_MS: u64 = 1000;

    /// Cadence without any delay, used by tests and deterministic demos.
    pub const fn immediate() -> Self {
        Self::Fixed { delay_ms: 0 }
    }

    /// Fixed cadence of `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed {
            delay_ms: delay.as_millis() as u64,
        }
    }

    /// Validates cadence settings.
    ///
    /// A random cadence needs a non-empty range to sample from.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let CadenceConfig::Random { max_delay_ms: 0 } = self {
            return Err(ValidationError::InvalidFieldValue {
                field: "generator.cadence.max_delay_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self::Random {
            max_delay_ms: Self::DEFAULT_MAX_DELAY_MS,
        }
    }
}

/// Configuration shared by every generator of a pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeneratorConfig {
    /// Delay between an acknowledgment and the next emission.
    #[serde(default)]
    pub cadence: CadenceConfig,
    /// Reply a generator writes when it confirms a quit request.
    #[serde(default = "default_farewell")]
    pub farewell: String,
}

impl GeneratorConfig {
    /// Default farewell written in reply to a confirmed quit.
    pub const DEFAULT_FAREWELL: &'static str = "See you!";

    /// Generator configuration that emits without delay.
    pub fn immediate() -> Self {
        Self {
            cadence: CadenceConfig::immediate(),
            farewell: default_farewell(),
        }
    }

    /// Validates generator settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.cadence.validate()?;

        if self.farewell.is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "generator.farewell".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cadence: CadenceConfig::default(),
            farewell: default_farewell(),
        }
    }
}

fn default_farewell() -> String {
    GeneratorConfig::DEFAULT_FAREWELL.to_string()
}
