//! Arm-on-demand timer for deadlines awaited inside `tokio::select!`.
//!
//! - [`DeferredTimer`] is `Unpin`, so `&mut timer` can be used directly as a `select!`
//!   branch.
//! - The timer stays pending while inactive, so an unarmed branch never fires.
//! - Re-arming replaces the inner sleep, measuring the duration from the re-arm instant.

use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::time::{Instant, Sleep, sleep};

/// A future that resolves after a configured duration once armed.
#[derive(Debug)]
pub struct DeferredTimer {
    /// The active deadline if armed, or `None` when inactive.
    deadline: Option<Pin<Box<Sleep>>>,
    /// Duration used when (re)arming the timer.
    duration: Duration,
}

impl DeferredTimer {
    /// Creates a new, inactive timer for the given `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            deadline: None,
            duration,
        }
    }

    /// Arms the timer so that it resolves `duration` from now.
    ///
    /// Replaces any previously armed deadline.
    pub fn start(&mut self) {
        self.deadline = Some(Box::pin(sleep(self.duration)));
    }

    /// Arms the timer only if it is not armed yet, keeping an existing deadline fixed.
    pub fn start_once(&mut self) {
        if self.deadline.is_none() {
            self.start();
        }
    }

    /// Returns the instant the timer fires at, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.as_ref().map(|sleep| sleep.deadline())
    }

    /// Returns `true` if the timer is armed.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

impl Future for DeferredTimer {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let Some(deadline) = this.deadline.as_mut() else {
            return Poll::Pending;
        };

        ready!(deadline.as_mut().poll(cx));

        Poll::Ready(())
    }
}
