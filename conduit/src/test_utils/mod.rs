pub mod generators;
pub mod wait;
