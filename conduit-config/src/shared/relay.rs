use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Relay chain configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RelayConfig {
    /// Number of stages in the chain.
    #[serde(default = "default_length")]
    pub length: usize,
    /// Value fed into the first stage.
    #[serde(default = "default_seed")]
    pub seed: i64,
}

impl RelayConfig {
    pub const DEFAULT_LENGTH: usize = 10_000;

    pub const DEFAULT_SEED: i64 = 1;

    /// Upper bound on stages, each stage being one task.
    pub const MAX_LENGTH: usize = 1_000_000;

    /// Validates relay settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.length > Self::MAX_LENGTH {
            return Err(ValidationError::InvalidFieldValue {
                field: "relay.length".to_string(),
                constraint: format!("must be <= {}", Self::MAX_LENGTH),
            });
        }

        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            seed: default_seed(),
        }
    }
}

fn default_length() -> usize {
    RelayConfig::DEFAULT_LENGTH
}

fn default_seed() -> i64 {
    RelayConfig::DEFAULT_SEED
}
