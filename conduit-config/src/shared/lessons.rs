use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::{
    DeadlineConfig, GeneratorConfig, RelayConfig, SequencerConfig, ValidationError,
};

/// Root configuration of the examples binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LessonsConfig {
    /// Labels of the generators started by multi-source lessons.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// Number of messages or batches each lesson consumes before quitting.
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default)]
    pub deadline: DeadlineConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl LessonsConfig {
    pub const DEFAULT_ROUNDS: usize = 5;

    /// Validates every section, including that batches can be filled by the sources.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sources.is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "sources".to_string(),
                constraint: "must name at least one source".to_string(),
            });
        }

        self.generator.validate()?;
        self.sequencer.validate_for_sources(self.sources.len())?;
        self.deadline.validate()?;
        self.relay.validate()?;

        Ok(())
    }
}

impl Default for LessonsConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            rounds: default_rounds(),
            generator: GeneratorConfig::default(),
            sequencer: SequencerConfig::default(),
            deadline: DeadlineConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl Config for LessonsConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["sources"];
}

fn default_sources() -> Vec<String> {
    vec!["Joe".to_string(), "Ann".to_string()]
}

fn default_rounds() -> usize {
    LessonsConfig::DEFAULT_ROUNDS
}
