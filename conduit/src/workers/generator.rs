//! Labelled message generator gated by acknowledgments.
//!
//! A generator emits `"<label> 0"`, `"<label> 1"`, ... and never emits message `i + 1`
//! before message `i` has been acknowledged. Each step of its loop is raced against the
//! quit channel:
//!
//! ```text
//!            ┌──────────── ack ◄──────────────┐
//!            ▼                                │
//!   emit ──► wait for ack ──► cadence delay ──┘
//!    │            │                 │
//!    └────────────┴───── quit ──────┴──► Stopped
//! ```
//!
//! `Running → Running` on acknowledgment, `Running → Stopped` on quit. The stopped state is
//! terminal.

use std::sync::Arc;
use std::time::Duration;

use conduit_config::shared::{CadenceConfig, GeneratorConfig};
use metrics::counter;
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::conduit_error;
use crate::error::{ConduitResult, ErrorKind};
use crate::metrics::{
    CONDUIT_GENERATORS_STOPPED_TOTAL, CONDUIT_MESSAGES_EMITTED_TOTAL, GENERATOR_LABEL,
};
use crate::quit::{QuitHandle, QuitRequest, QuitRx, create_quit_channel};
use crate::types::{Message, MessageStream, message_channel};

/// Lifecycle state of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Emitting messages or waiting for an acknowledgment.
    Running,
    /// Terminated; no further message will be emitted.
    Stopped,
}

impl GeneratorState {
    fn as_str(&self) -> &'static str {
        match self {
            GeneratorState::Running => "running",
            GeneratorState::Stopped => "stopped",
        }
    }
}

/// Why a generator left its loop.
#[derive(Debug)]
enum Exit {
    /// A quit request was served.
    Quit(QuitRequest),
    /// Every quit handle was dropped.
    Released,
    /// The consumer dropped the stream.
    Disconnected,
}

impl From<Option<QuitRequest>> for Exit {
    fn from(request: Option<QuitRequest>) -> Self {
        match request {
            Some(request) => Exit::Quit(request),
            None => Exit::Released,
        }
    }
}

/// Starts a generator labelled `label`.
///
/// Returns the stream of its messages and the handle controlling its lifecycle.
pub fn start_generator(
    label: impl Into<String>,
    config: GeneratorConfig,
) -> (MessageStream, GeneratorHandle) {
    Generator::new(label, config).start()
}

/// A not yet started generator.
#[derive(Debug, Clone)]
pub struct Generator {
    label: Arc<str>,
    config: GeneratorConfig,
}

impl Generator {
    /// Creates a generator labelled `label`.
    pub fn new(label: impl Into<String>, config: GeneratorConfig) -> Self {
        Self {
            label: Arc::from(label.into()),
            config,
        }
    }

    /// Spawns the generator task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> (MessageStream, GeneratorHandle) {
        let (tx, stream) = message_channel();
        let (quit_handle, quit_rx) = create_quit_channel(self.label.clone());
        let (state_tx, state_rx) = watch::channel(GeneratorState::Running);

        let worker = GeneratorWorker {
            label: self.label.clone(),
            config: self.config,
            tx,
            quit_rx,
            state_tx,
        };
        let join_handle = tokio::spawn(worker.run());

        let handle = GeneratorHandle {
            label: self.label,
            quit_handle,
            state_rx,
            join_handle,
        };

        (stream, handle)
    }
}

/// Handle owning a running generator.
///
/// Dropping the handle (and every [`QuitHandle`] cloned from it) stops the generator.
#[derive(Debug)]
pub struct GeneratorHandle {
    label: Arc<str>,
    quit_handle: QuitHandle,
    state_rx: watch::Receiver<GeneratorState>,
    join_handle: JoinHandle<u64>,
}

impl GeneratorHandle {
    /// Returns the generator label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> GeneratorState {
        *self.state_rx.borrow()
    }

    /// Returns a quit handle addressing this generator.
    pub fn quit_handle(&self) -> QuitHandle {
        self.quit_handle.clone()
    }

    /// Requests the generator to stop without waiting. See [`QuitHandle::quit`].
    pub fn quit(&self) -> bool {
        self.quit_handle.quit()
    }

    /// Requests the generator to stop and returns its farewell.
    /// See [`QuitHandle::quit_and_wait`].
    pub async fn quit_and_wait(&self) -> ConduitResult<String> {
        self.quit_handle.quit_and_wait().await
    }

    /// Waits until the generator reaches [`GeneratorState::Stopped`].
    pub async fn stopped(&mut self) {
        // The sender lives until the task ends, and the task publishes `Stopped` before that.
        let _ = self
            .state_rx
            .wait_for(|state| *state == GeneratorState::Stopped)
            .await;
    }

    /// Waits for the generator task to finish and returns how many messages it emitted.
    ///
    /// Only returns once the generator has stopped, so callers quit it or drop its stream
    /// first.
    pub async fn wait(self) -> ConduitResult<u64> {
        match self.join_handle.await {
            Ok(emitted) => Ok(emitted),
            Err(err) if err.is_panic() => {
                error!(label = %self.label, "generator task panicked");
                Err(conduit_error!(
                    ErrorKind::GeneratorPanic,
                    "Generator task panicked",
                    self.label,
                    source: err
                ))
            }
            Err(err) => Err(conduit_error!(
                ErrorKind::GeneratorStopped,
                "Generator task was cancelled",
                self.label,
                source: err
            )),
        }
    }
}

/// State owned by the spawned generator task.
struct GeneratorWorker {
    label: Arc<str>,
    config: GeneratorConfig,
    tx: mpsc::Sender<Message>,
    quit_rx: QuitRx,
    state_tx: watch::Sender<GeneratorState>,
}

impl GeneratorWorker {
    /// Main generator loop. Returns the number of messages emitted.
    async fn run(mut self) -> u64 {
        info!(label = %self.label, "starting generator");

        let mut emitted: u64 = 0;

        let exit = loop {
            let (message, ack_rx) = Message::new(format!("{} {}", self.label, emitted));

            // The quit branch comes first so that a pending request is never starved.
            tokio::select! {
                biased;

                request = self.quit_rx.recv() => break Exit::from(request),
                result = self.tx.send(message) => {
                    if result.is_err() {
                        break Exit::Disconnected;
                    }
                }
            }

            debug!(label = %self.label, index = emitted, "message emitted");
            counter!(CONDUIT_MESSAGES_EMITTED_TOTAL, GENERATOR_LABEL => self.label.to_string())
                .increment(1);
            emitted += 1;

            tokio::select! {
                biased;

                request = self.quit_rx.recv() => break Exit::from(request),
                ack = ack_rx => {
                    if ack.is_err() {
                        warn!(
                            label = %self.label,
                            index = emitted - 1,
                            "message dropped without acknowledgment, generator parked until quit"
                        );

                        tokio::select! {
                            biased;

                            request = self.quit_rx.recv() => break Exit::from(request),
                            _ = self.tx.closed() => break Exit::Disconnected,
                        }
                    }
                }
            }

            let delay = self.next_delay();
            if !delay.is_zero() {
                tokio::select! {
                    biased;

                    request = self.quit_rx.recv() => break Exit::from(request),
                    _ = sleep(delay) => {}
                }
            }
        };

        self.finish(exit, emitted)
    }

    /// Computes the delay before the next emission.
    fn next_delay(&self) -> Duration {
        match self.config.cadence {
            CadenceConfig::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            CadenceConfig::Random { max_delay_ms: 0 } => Duration::ZERO,
            CadenceConfig::Random { max_delay_ms } => {
                Duration::from_millis(rand::rng().random_range(0..max_delay_ms))
            }
        }
    }

    /// Moves the generator to the stopped state.
    ///
    /// The stream and the quit channel are closed before the farewell is written, and
    /// writing the farewell is the last thing the generator does.
    fn finish(self, exit: Exit, emitted: u64) -> u64 {
        let GeneratorWorker {
            label,
            config,
            tx,
            quit_rx,
            state_tx,
        } = self;

        drop(tx);
        drop(quit_rx);

        state_tx.send_replace(GeneratorState::Stopped);
        counter!(CONDUIT_GENERATORS_STOPPED_TOTAL, GENERATOR_LABEL => label.to_string())
            .increment(1);

        let state = GeneratorState::Stopped.as_str();
        match exit {
            Exit::Quit(QuitRequest::Forget) => {
                info!(%label, emitted, state, "generator quit");
            }
            Exit::Quit(QuitRequest::Confirm(reply)) => {
                info!(%label, emitted, state, "generator quit, sending farewell");
                if reply.send(config.farewell).is_err() {
                    debug!(%label, "quit requester went away before the farewell");
                }
            }
            Exit::Released => {
                info!(%label, emitted, state, "all quit handles dropped, generator stopped");
            }
            Exit::Disconnected => {
                info!(%label, emitted, state, "consumer dropped the stream, generator stopped");
            }
        }

        emitted
    }
}
