//! Broadcast stop signal for consumers.
//!
//! Built on a [`watch`] channel so that every subscriber observes the same signal, including
//! subscribers created after the signal was sent.

use std::sync::Arc;
use tokio::sync::watch;

/// Result of an operation that can be interrupted by a shutdown signal.
///
/// The shutdown variant carries whatever was gathered before the signal was observed.
#[derive(Debug, PartialEq, Eq)]
pub enum ShutdownResult<T, I> {
    Ok(T),
    Shutdown(I),
}

impl<T, I> ShutdownResult<T, I> {
    /// Returns `true` if the operation was interrupted.
    pub fn should_shutdown(&self) -> bool {
        matches!(self, ShutdownResult::Shutdown(_))
    }
}

/// Transmitter side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownTx(Arc<watch::Sender<bool>>);

impl ShutdownTx {
    /// Signals shutdown to every current and future subscriber.
    pub fn shutdown(&self) {
        // Infallible send so that shutting down without subscribers is not an error.
        self.0.send_replace(true);
    }

    /// Creates a new subscription.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

/// Receiver side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    /// Returns `true` once shutdown has been signalled.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until shutdown is signalled.
    ///
    /// Never resolves if the transmitter is dropped without signalling.
    pub async fn wait_for_shutdown(&mut self) {
        if self.0.wait_for(|shutdown| *shutdown).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Creates a new shutdown channel in the running state.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(Arc::new(tx)), ShutdownRx(rx))
}
