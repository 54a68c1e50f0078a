//! Linear chain of one-shot relay stages.
//!
//! Each stage owns the receiving side of its upstream hand-off and the sending side of its
//! downstream one. It waits for one value, applies the chain's transform, forwards the
//! result and terminates.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::conduit_error;
use crate::error::{ConduitResult, ErrorKind};

/// Transform applied by every stage of a chain.
pub type RelayTransform = Arc<dyn Fn(i64) -> i64 + Send + Sync>;

/// Builder of a relay chain.
#[derive(Clone)]
pub struct RelayChain {
    length: usize,
    transform: RelayTransform,
}

impl RelayChain {
    /// Creates a chain of `length` stages, each incrementing its value by one.
    ///
    /// The increment saturates, so a value that reaches [`i64::MAX`] stays there.
    pub fn new(length: usize) -> Self {
        Self::with_transform(length, |value| value.saturating_add(1))
    }

    /// Creates a chain of `length` stages, each applying `transform`.
    pub fn with_transform<F>(length: usize, transform: F) -> Self
    where
        F: Fn(i64) -> i64 + Send + Sync + 'static,
    {
        Self {
            length,
            transform: Arc::new(transform),
        }
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` for a chain without stages.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Spawns every stage and returns the two ends of the chain.
    ///
    /// Stages are spawned from the output towards the trigger, so each stage is handed the
    /// sender its downstream neighbour listens on. A chain of length zero connects the
    /// trigger directly to the output.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> (RelayTrigger, RelayOutput) {
        let (trigger_tx, mut upstream_rx) = oneshot::channel();
        let mut stages = JoinSet::new();

        for stage in 0..self.length {
            let (downstream_tx, downstream_rx) = oneshot::channel();
            stages.spawn(run_stage(
                stage,
                upstream_rx,
                downstream_tx,
                self.transform.clone(),
            ));
            upstream_rx = downstream_rx;
        }

        debug!(length = self.length, "relay chain started");

        let trigger = RelayTrigger { tx: trigger_tx };
        let output = RelayOutput {
            rx: upstream_rx,
            stages,
            length: self.length,
        };

        (trigger, output)
    }
}

impl fmt::Debug for RelayChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayChain")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Runs a single stage: receive, transform, forward.
async fn run_stage(
    stage: usize,
    upstream: oneshot::Receiver<i64>,
    downstream: oneshot::Sender<i64>,
    transform: RelayTransform,
) {
    let Ok(value) = upstream.await else {
        debug!(stage, "relay upstream dropped, stage terminated");
        return;
    };

    if downstream.send(transform(value)).is_err() {
        debug!(stage, "relay downstream dropped, stage terminated");
    }
}

/// Entry point of a relay chain, fed exactly once.
#[derive(Debug)]
pub struct RelayTrigger {
    tx: oneshot::Sender<i64>,
}

impl RelayTrigger {
    /// Feeds `seed` to the first stage.
    ///
    /// Fails with [`ErrorKind::RelayBroken`] if the chain has already been torn down.
    pub fn send(self, seed: i64) -> ConduitResult<()> {
        if self.tx.send(seed).is_err() {
            return Err(conduit_error!(
                ErrorKind::RelayBroken,
                "Relay chain was dropped before the seed was sent",
                seed
            ));
        }

        Ok(())
    }
}

/// Terminal end of a relay chain.
///
/// Owns the stage tasks; dropping the output aborts every stage that has not finished.
#[derive(Debug)]
pub struct RelayOutput {
    rx: oneshot::Receiver<i64>,
    stages: JoinSet<()>,
    length: usize,
}

impl RelayOutput {
    /// Waits for the value produced by the last stage.
    ///
    /// Fails with [`ErrorKind::RelayStagePanic`] if a stage panicked and with
    /// [`ErrorKind::RelayBroken`] if the chain ended without a value, for example because
    /// the trigger was dropped.
    pub async fn recv(mut self) -> ConduitResult<i64> {
        if let Ok(value) = (&mut self.rx).await {
            return Ok(value);
        }

        let mut errors = Vec::new();
        while let Some(result) = self.stages.join_next().await {
            if let Err(err) = result
                && err.is_panic()
            {
                error!("relay stage panicked");
                errors.push(conduit_error!(
                    ErrorKind::RelayStagePanic,
                    "Relay stage panicked",
                    source: err
                ));
            }
        }

        if errors.is_empty() {
            return Err(conduit_error!(
                ErrorKind::RelayBroken,
                "Relay chain ended without producing a value",
                format!("chain of {} stages", self.length)
            ));
        }

        Err(errors.into())
    }
}

/// Builds a chain of `length` incrementing stages, seeds it and returns the terminal value.
pub async fn relay(length: usize, seed: i64) -> ConduitResult<i64> {
    let (trigger, output) = RelayChain::new(length).start();
    trigger.send(seed)?;

    let value = output.recv().await?;
    info!(length, seed, value, "relay chain completed");

    Ok(value)
}
