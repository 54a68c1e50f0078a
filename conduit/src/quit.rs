//! Quit requests addressed to generators.
//!
//! A generator races every emission, every acknowledgment wait and every cadence delay
//! against its quit channel, so a quit request is never blocked by a message nobody is
//! receiving.
//!
//! Repeated or concurrent quit requests are idempotent: the first one served stops the
//! generator and every later one is ignored. A fire-and-forget request reports that it was
//! ignored by returning `false`; a confirmed request fails with
//! [`ErrorKind::GeneratorStopped`].

use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::conduit_error;
use crate::error::{ConduitResult, ErrorKind};

/// Capacity of the quit channel; one pending request is enough to stop a generator.
const QUIT_CAPACITY: usize = 1;

/// One-shot request asking a generator to stop.
#[derive(Debug)]
pub enum QuitRequest {
    /// Stop without confirmation.
    Forget,
    /// Stop and write a farewell into the reply slot as the very last action.
    Confirm(oneshot::Sender<String>),
}

/// Receiving side of a generator's quit channel.
pub(crate) type QuitRx = mpsc::Receiver<QuitRequest>;

/// Handle used to ask one generator to stop.
///
/// Handles are cheap to clone. Once every handle of a generator is dropped, the generator
/// stops on its own, so no generator can outlive all of its controllers.
#[derive(Debug, Clone)]
pub struct QuitHandle {
    label: Arc<str>,
    tx: mpsc::Sender<QuitRequest>,
}

impl QuitHandle {
    /// Returns the label of the generator this handle addresses.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Requests the generator to stop without waiting for it.
    ///
    /// Never blocks. Returns `true` if this call enqueued the request, `false` if a quit
    /// request is already pending or the generator has already stopped.
    pub fn quit(&self) -> bool {
        match self.tx.try_send(QuitRequest::Forget) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(label = %self.label, "quit already pending, request ignored");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(label = %self.label, "generator already stopped, request ignored");
                false
            }
        }
    }

    /// Requests the generator to stop and waits for its farewell.
    ///
    /// The farewell is written after the generator closed its stream, so once this returns
    /// no further message from the generator can be received.
    pub async fn quit_and_wait(&self) -> ConduitResult<String> {
        let (reply_tx, reply_rx) = oneshot::channel();

        if self.tx.send(QuitRequest::Confirm(reply_tx)).await.is_err() {
            return Err(conduit_error!(
                ErrorKind::GeneratorStopped,
                "Generator already stopped",
                self.label
            ));
        }

        reply_rx.await.map_err(|_| {
            conduit_error!(
                ErrorKind::GeneratorStopped,
                "Generator stopped before confirming the quit request",
                self.label
            )
        })
    }

    /// Returns `true` once the generator no longer accepts quit requests.
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Creates the quit channel for the generator labelled `label`.
pub(crate) fn create_quit_channel(label: Arc<str>) -> (QuitHandle, QuitRx) {
    let (tx, rx) = mpsc::channel(QUIT_CAPACITY);
    (QuitHandle { label, tx }, rx)
}
