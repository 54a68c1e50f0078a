//! Merging of several message streams into one.
//!
//! Acknowledgments travel with each message, so a source still waits for its own consumer
//! after its messages were merged.

use futures::StreamExt;
use futures::stream::select_all;
use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::metrics::CONDUIT_MESSAGES_FORWARDED_TOTAL;
use crate::types::{HANDOFF_CAPACITY, Message, MessageStream};

/// Merges `inputs` into a single stream, spawning one forwarding task per input.
///
/// Messages of one input keep their relative order; messages of different inputs interleave
/// in arrival order. The merged stream ends once every input has ended, and dropping it
/// aborts the forwarders.
///
/// Must be called from within a Tokio runtime.
pub fn fan_in<I>(inputs: I) -> MessageStream
where
    I: IntoIterator<Item = MessageStream>,
{
    let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
    let mut forwarders = JoinSet::new();

    for (input_index, input) in inputs.into_iter().enumerate() {
        forwarders.spawn(forward(input_index, input, tx.clone()));
    }

    debug!(inputs = forwarders.len(), "fan-in started");

    MessageStream::with_forwarders(rx, forwarders)
}

/// Merges `inputs` with a single task that polls every input.
///
/// Delivery guarantees are those of [`fan_in`].
pub fn fan_in_select<I>(inputs: I) -> MessageStream
where
    I: IntoIterator<Item = MessageStream>,
{
    let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
    let mut inputs = select_all(inputs);
    let mut forwarders = JoinSet::new();

    forwarders.spawn(async move {
        debug!(inputs = inputs.len(), "select fan-in started");

        loop {
            let message = tokio::select! {
                biased;

                _ = tx.closed() => break,
                message = inputs.next() => match message {
                    Some(message) => message,
                    None => break,
                },
            };

            if !deliver(&tx, message).await {
                break;
            }
        }

        debug!("select fan-in finished");
    });

    MessageStream::with_forwarders(rx, forwarders)
}

/// Forwards every message of `input` to `tx` until either side ends.
async fn forward(input_index: usize, mut input: MessageStream, tx: mpsc::Sender<Message>) {
    loop {
        let message = tokio::select! {
            biased;

            _ = tx.closed() => break,
            message = input.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        if !deliver(&tx, message).await {
            break;
        }
    }

    debug!(input_index, "fan-in forwarder finished");
}

/// Sends `message` downstream. Returns `false` once the merged stream is gone.
async fn deliver(tx: &mpsc::Sender<Message>, message: Message) -> bool {
    trace!(content = %message.content(), "forwarding message");

    if tx.send(message).await.is_err() {
        return false;
    }

    counter!(CONDUIT_MESSAGES_FORWARDED_TOTAL).increment(1);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::generator::start_generator;
    use conduit_config::shared::GeneratorConfig;
    use std::collections::HashSet;

    #[tokio::test]
    async fn merges_every_input_without_loss() {
        let (joe, joe_handle) = start_generator("Joe", GeneratorConfig::immediate());
        let (ann, ann_handle) = start_generator("Ann", GeneratorConfig::immediate());

        let mut merged = fan_in([joe, ann]);
        assert_eq!(merged.active_forwarders(), 2);

        let mut seen = HashSet::new();
        for _ in 0..10 {
            let message = merged.recv().await.unwrap();
            assert!(seen.insert(message.content().to_string()));
            assert!(message.acknowledge());
        }

        assert!(seen.iter().any(|content| content.starts_with("Joe ")));
        assert!(seen.iter().any(|content| content.starts_with("Ann ")));

        joe_handle.quit_and_wait().await.unwrap();
        ann_handle.quit_and_wait().await.unwrap();
        assert!(merged.recv().await.is_none());
    }

    #[tokio::test]
    async fn select_variant_preserves_per_input_order() {
        let (joe, joe_handle) = start_generator("Joe", GeneratorConfig::immediate());

        let mut merged = fan_in_select([joe]);

        for index in 0..5 {
            let message = merged.recv().await.unwrap();
            assert_eq!(message.content(), format!("Joe {index}"));
            assert!(message.acknowledge());
        }

        joe_handle.quit_and_wait().await.unwrap();
        assert!(merged.recv().await.is_none());
    }

    #[tokio::test]
    async fn merged_stream_of_no_inputs_ends_immediately() {
        let mut merged = fan_in(Vec::new());

        assert!(merged.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_merged_stream_releases_the_generators() {
        let (joe, joe_handle) = start_generator("Joe", GeneratorConfig::immediate());

        let merged = fan_in([joe]);
        drop(merged);

        // With its forwarder aborted, the generator sees its stream disconnected.
        assert!(joe_handle.wait().await.unwrap() <= 1);
    }
}
