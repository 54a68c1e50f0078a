//! Shared configuration types for conduit pipelines.

mod base;
mod deadline;
mod generator;
mod lessons;
mod relay;
mod sequencer;

pub use base::ValidationError;
pub use deadline::{DeadlineConfig, DeadlineMode};
pub use generator::{CadenceConfig, GeneratorConfig};
pub use lessons::LessonsConfig;
pub use relay::RelayConfig;
pub use sequencer::SequencerConfig;
