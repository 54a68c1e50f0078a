//! Groups of generators started, merged and stopped together.
//!
//! A group owns the stop signal shared by its consumers and tears its members down in a
//! fixed order: quit with confirmation, join, then release the streams.

use conduit_config::shared::GeneratorConfig;
use tracing::{info, warn};

use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::error::{ConduitError, ConduitResult};
use crate::types::MessageStream;
use crate::workers::fan_in::fan_in;
use crate::workers::generator::{Generator, GeneratorHandle};

/// A set of generators sharing one configuration and one stop signal.
///
/// Shutdown follows the documented teardown order: every generator is quit with
/// confirmation first, then its task is joined, and only then may the merged stream be
/// discarded.
#[derive(Debug)]
pub struct GeneratorGroup {
    handles: Vec<GeneratorHandle>,
    streams: Vec<MessageStream>,
    shutdown_tx: ShutdownTx,
}

impl GeneratorGroup {
    /// Starts one generator per label.
    pub fn start<I, S>(labels: I, config: &GeneratorConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (shutdown_tx, _) = create_shutdown_channel();
        let mut handles = Vec::new();
        let mut streams = Vec::new();

        for label in labels {
            let (stream, handle) = Generator::new(label, config.clone()).start();
            streams.push(stream);
            handles.push(handle);
        }

        info!(generators = handles.len(), "generator group started");

        Self {
            handles,
            streams,
            shutdown_tx,
        }
    }

    /// Returns the number of generators in the group.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if the group has no generators.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns the generator labels in member order.
    pub fn labels(&self) -> Vec<&str> {
        self.handles.iter().map(GeneratorHandle::label).collect()
    }

    /// Returns the member handles.
    pub fn handles(&self) -> &[GeneratorHandle] {
        &self.handles
    }

    /// Returns a receiver of the group's stop signal, for example to wrap the merged
    /// stream in a [`crate::concurrency::stream::BatchStream`].
    pub fn shutdown_rx(&self) -> ShutdownRx {
        self.shutdown_tx.subscribe()
    }

    /// Takes the members' streams, merged with [`fan_in`].
    ///
    /// Returns `None` once the streams have been taken.
    pub fn merged(&mut self) -> Option<MessageStream> {
        if self.streams.is_empty() && !self.handles.is_empty() {
            return None;
        }

        Some(fan_in(std::mem::take(&mut self.streams)))
    }

    /// Takes the members' streams without merging them, in member order.
    pub fn take_streams(&mut self) -> Vec<MessageStream> {
        std::mem::take(&mut self.streams)
    }

    /// Stops every generator and returns their farewells in member order.
    ///
    /// The stop signal is raised first so that consumers built on [`Self::shutdown_rx`]
    /// return what they hold. Failures of individual members are collected and returned
    /// together once every member has been waited for.
    pub async fn shutdown(self) -> ConduitResult<Vec<String>> {
        self.shutdown_tx.shutdown();

        let mut farewells = Vec::with_capacity(self.handles.len());
        let mut errors: Vec<ConduitError> = Vec::new();

        for handle in &self.handles {
            match handle.quit_and_wait().await {
                Ok(farewell) => farewells.push(farewell),
                Err(err) => {
                    warn!(label = handle.label(), error = %err, "generator did not confirm quit");
                    errors.push(err);
                }
            }
        }

        for handle in self.handles {
            let label = handle.label().to_string();
            match handle.wait().await {
                Ok(emitted) => info!(%label, emitted, "generator joined"),
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(farewells)
    }
}
