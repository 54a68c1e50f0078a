use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Batch sequencing configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SequencerConfig {
    /// Number of messages collected before a batch is released.
    ///
    /// Must not exceed the number of permanently live sources, otherwise a batch never fills.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl SequencerConfig {
    /// Default batch size, one message per source of the two-source lesson.
    pub const DEFAULT_BATCH_SIZE: usize = 2;

    /// Validates batch settings.
    ///
    /// Ensures batch_size is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "sequencer.batch_size".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Validates that `sources` live generators can fill a batch.
    pub fn validate_for_sources(&self, sources: usize) -> Result<(), ValidationError> {
        self.validate()?;

        if self.batch_size > sources {
            return Err(ValidationError::BatchLargerThanSources {
                batch_size: self.batch_size,
                sources,
            });
        }

        Ok(())
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    SequencerConfig::DEFAULT_BATCH_SIZE
}
