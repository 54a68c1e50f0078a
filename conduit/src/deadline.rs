//! Deadline-bounded consumption of a message stream.
//!
//! A timeout is an expected outcome and is reported as [`Guarded::TimedOut`], never as an
//! error. Firing the deadline only stops the consumer's wait; the generators feeding the
//! stream keep running until they are quit.

use std::time::Duration;

use conduit_config::shared::{DeadlineConfig, DeadlineMode};
use futures::{Stream, StreamExt};
use metrics::counter;
use tokio::time::{Instant, timeout};
use tracing::{debug, info};

use crate::concurrency::timer::DeferredTimer;
use crate::metrics::CONDUIT_DEADLINE_TIMEOUTS_TOTAL;
use crate::types::Message;

/// Receives one message, giving up after `duration`.
///
/// Returns `None` if the deadline elapsed or the stream ended first.
pub async fn with_timeout<S>(stream: &mut S, duration: Duration) -> Option<Message>
where
    S: Stream<Item = Message> + Unpin,
{
    match timeout(duration, stream.next()).await {
        Ok(message) => message,
        Err(_) => {
            counter!(CONDUIT_DEADLINE_TIMEOUTS_TOTAL).increment(1);
            debug!(timeout_ms = duration.as_millis() as u64, "receive timed out");
            None
        }
    }
}

/// Outcome of a guarded receive.
#[derive(Debug)]
pub enum Guarded {
    /// A message arrived before the deadline.
    Message(Message),
    /// The deadline elapsed first.
    TimedOut,
    /// The stream ended before the deadline.
    Closed,
}

/// How a [`DeadlineGuard::drain`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    TimedOut,
    Closed,
}

/// Summary of a [`DeadlineGuard::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    /// Messages handed to the handler.
    pub received: usize,
    /// Why draining stopped.
    pub end: DrainEnd,
}

/// Wraps a stream so that every receive races a deadline.
///
/// With [`DeadlineMode::Absolute`] the deadline is fixed at the first receive and shared by
/// every later one, so consumption ends at a predictable instant however fast messages
/// arrive. With [`DeadlineMode::PerReceive`] each receive gets the full timeout again.
///
/// Once an absolute deadline has elapsed, every further receive reports
/// [`Guarded::TimedOut`].
#[derive(Debug)]
pub struct DeadlineGuard<S> {
    stream: S,
    timer: DeferredTimer,
    mode: DeadlineMode,
}

impl<S> DeadlineGuard<S>
where
    S: Stream<Item = Message> + Unpin,
{
    /// Creates a guard over `stream`. The deadline is not armed until the first receive.
    pub fn new(stream: S, config: &DeadlineConfig) -> Self {
        Self {
            stream,
            timer: DeferredTimer::new(config.timeout()),
            mode: config.mode,
        }
    }

    /// Returns the instant the current deadline elapses at, once armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Receives the next message unless the deadline elapses first.
    pub async fn recv(&mut self) -> Guarded {
        match self.mode {
            DeadlineMode::Absolute => self.timer.start_once(),
            DeadlineMode::PerReceive => self.timer.start(),
        }

        // The timer goes first so that an elapsed deadline always wins.
        tokio::select! {
            biased;

            _ = &mut self.timer => {
                counter!(CONDUIT_DEADLINE_TIMEOUTS_TOTAL).increment(1);
                Guarded::TimedOut
            }
            message = self.stream.next() => match message {
                Some(message) => Guarded::Message(message),
                None => Guarded::Closed,
            },
        }
    }

    /// Hands every message to `handler` until the deadline elapses or the stream ends.
    ///
    /// The handler owns each message and is responsible for acknowledging it.
    pub async fn drain<F>(&mut self, mut handler: F) -> DrainSummary
    where
        F: FnMut(Message),
    {
        let mut received = 0;

        let end = loop {
            match self.recv().await {
                Guarded::Message(message) => {
                    received += 1;
                    handler(message);
                }
                Guarded::TimedOut => break DrainEnd::TimedOut,
                Guarded::Closed => break DrainEnd::Closed,
            }
        };

        info!(received, end = ?end, "deadline guard drained");

        DrainSummary { received, end }
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::generator::start_generator;
    use conduit_config::shared::{CadenceConfig, GeneratorConfig};

    fn every(delay: Duration) -> GeneratorConfig {
        GeneratorConfig {
            cadence: CadenceConfig::fixed(delay),
            ..GeneratorConfig::immediate()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn single_receive_times_out_before_a_slow_generator() {
        let (mut stream, handle) = start_generator("Joe", every(Duration::from_secs(2)));

        let first = with_timeout(&mut stream, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(first.acknowledge());

        assert!(
            with_timeout(&mut stream, Duration::from_millis(100))
                .await
                .is_none()
        );

        handle.quit_and_wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn absolute_deadline_bounds_the_whole_loop() {
        let (stream, handle) = start_generator("Joe", every(Duration::from_millis(1500)));
        let config = DeadlineConfig {
            timeout_ms: 5000,
            mode: DeadlineMode::Absolute,
        };
        let mut guard = DeadlineGuard::new(stream, &config);

        let started = Instant::now();
        let summary = guard
            .drain(|message| {
                message.acknowledge();
            })
            .await;

        assert_eq!(summary.end, DrainEnd::TimedOut);
        assert_eq!(summary.received, 4);
        assert_eq!(guard.deadline(), Some(started + Duration::from_secs(5)));
        assert!(matches!(guard.recv().await, Guarded::TimedOut));

        handle.quit_and_wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn per_receive_deadline_restarts_on_every_receive() {
        let (stream, handle) = start_generator("Joe", every(Duration::from_millis(1500)));
        let config = DeadlineConfig {
            timeout_ms: 2000,
            mode: DeadlineMode::PerReceive,
        };
        let mut guard = DeadlineGuard::new(stream, &config);

        for index in 0..5 {
            let Guarded::Message(message) = guard.recv().await else {
                panic!("expected message {index}");
            };
            assert_eq!(message.content(), format!("Joe {index}"));
            assert!(message.acknowledge());
        }

        handle.quit_and_wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn closed_stream_is_reported() {
        let (stream, handle) = start_generator("Joe", GeneratorConfig::immediate());
        let mut guard = DeadlineGuard::new(stream, &DeadlineConfig::default());

        handle.quit_and_wait().await.unwrap();

        assert!(matches!(guard.recv().await, Guarded::Closed));
    }
}
