//! Long-running tasks and the handles that own them.
//!
//! Every spawned task has an owner: a generator is owned by its [`generator::GeneratorHandle`],
//! fan-in forwarders by the merged [`crate::types::MessageStream`] and relay stages by the
//! [`relay::RelayOutput`].

pub mod fan_in;
pub mod generator;
pub mod group;
pub mod relay;
