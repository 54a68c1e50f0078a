//! Channel coordination patterns: labelled generators gated by acknowledgments, fan-in
//! multiplexing, batch sequencing, deadline-bounded consumption, quit signalling and
//! relay chains.
//!
//! Every concurrent task started by this crate is owned by a handle: generators by a
//! [`workers::generator::GeneratorHandle`], fan-in forwarders by the merged
//! [`types::MessageStream`] and relay stages by the [`workers::relay::RelayOutput`].

mod macros;

pub mod concurrency;
pub mod deadline;
pub mod error;
pub mod metrics;
pub mod quit;
pub mod sequencer;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
