use std::fmt;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::timeout;

/// Default bound for waits in tests.
///
/// Everything awaited in tests involves zero-cadence generators, so a few seconds is plenty.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds waits in tests so that a stalled pipeline fails instead of hanging.
#[derive(Clone, Copy)]
pub struct TimedWait {
    timeout_duration: Duration,
}

impl TimedWait {
    /// Creates a [`TimedWait`] with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_WAIT_TIMEOUT)
    }

    /// Creates a [`TimedWait`] with a custom timeout.
    pub fn with_timeout(timeout_duration: Duration) -> Self {
        Self { timeout_duration }
    }

    /// Awaits `future`, panicking if it does not complete in time.
    ///
    /// # Panics
    ///
    /// Panics if the timeout elapses first.
    pub async fn within<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        match timeout(self.timeout_duration, future).await {
            Ok(output) => output,
            Err(_) => panic!(
                "Test wait timed out after {:?}. \
                 This likely indicates a generator is parked on an acknowledgment.",
                self.timeout_duration
            ),
        }
    }

    /// Returns `true` if `future` is still pending once the timeout has elapsed.
    pub async fn stays_pending<F>(&self, future: F) -> bool
    where
        F: Future,
    {
        timeout(self.timeout_duration, future).await.is_err()
    }
}

impl Default for TimedWait {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimedWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedWait")
            .field("timeout_duration", &self.timeout_duration)
            .finish()
    }
}

/// Returns `true` if `future` cannot complete without yielding.
pub fn is_pending_now<F>(future: F) -> bool
where
    F: Future,
{
    Box::pin(future).now_or_never().is_none()
}
