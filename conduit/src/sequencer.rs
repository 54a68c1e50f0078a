//! Batch sequencing over a merged stream.
//!
//! Pulling exactly one message per source and acknowledging the whole batch before asking
//! for the next one produces a round-robin cadence: every generator is parked on its own
//! acknowledgment until the batch completes, so no source can contribute twice to a batch
//! whose size equals the number of sources.
//!
//! Liveness requires the batch size not to exceed the number of permanently live sources;
//! otherwise [`next_batch`] waits forever.

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::bail;
use crate::error::{ConduitResult, ErrorKind};
use crate::types::Message;

/// An ordered group of messages pulled from a stream, in arrival order.
#[must_use = "every message of a batch must be acknowledged before the next batch is requested"]
#[derive(Debug, Default)]
pub struct Batch {
    messages: Vec<Message>,
}

impl Batch {
    pub(crate) fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Returns the number of messages in the batch.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the batch holds no message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the message contents in arrival order.
    pub fn contents(&self) -> Vec<&str> {
        self.messages.iter().map(Message::content).collect()
    }

    /// Iterates over the messages in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Acknowledges every message, releasing their generators.
    ///
    /// Returns the number of acknowledgments that reached a running generator.
    pub fn acknowledge_all(self) -> usize {
        self.messages
            .into_iter()
            .map(Message::acknowledge)
            .filter(|delivered| *delivered)
            .count()
    }

    /// Gives up the batch, leaving acknowledgment order to the caller.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl IntoIterator for Batch {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

/// Messages collected by a [`next_batch`] call that has not completed yet.
///
/// Dropping it acknowledges every message it still holds, so a collection that fails or is
/// cancelled mid-way releases the generators it was holding.
#[derive(Debug)]
struct PendingBatch {
    messages: Vec<Message>,
}

impl PendingBatch {
    fn with_capacity(size: usize) -> Self {
        Self {
            messages: Vec::with_capacity(size),
        }
    }

    fn len(&self) -> usize {
        self.messages.len()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn complete(mut self) -> Batch {
        Batch::new(std::mem::take(&mut self.messages))
    }
}

impl Drop for PendingBatch {
    fn drop(&mut self) {
        if self.messages.is_empty() {
            return;
        }

        let collected = self.messages.len();
        let released = Batch::new(std::mem::take(&mut self.messages)).acknowledge_all();
        debug!(collected, released, "unfinished batch released");
    }
}

/// Pulls exactly `size` messages from `stream`, waiting for each one.
///
/// Fails with [`ErrorKind::InvalidBatchSize`] when `size` is zero and with
/// [`ErrorKind::StreamClosed`] when the stream ends first.
///
/// Cancel safe: if the future is dropped before the batch is full, for example because it
/// was wrapped in [`tokio::time::timeout`], the messages collected so far are acknowledged
/// and their generators move on. The same happens when the stream ends early.
pub async fn next_batch<S>(stream: &mut S, size: usize) -> ConduitResult<Batch>
where
    S: Stream<Item = Message> + Unpin,
{
    if size == 0 {
        bail!(
            ErrorKind::InvalidBatchSize,
            "Batch size must be greater than zero"
        );
    }

    let mut pending = PendingBatch::with_capacity(size);
    while pending.len() < size {
        match stream.next().await {
            Some(message) => pending.push(message),
            None => {
                let collected = pending.len();
                drop(pending);

                bail!(
                    ErrorKind::StreamClosed,
                    "Stream ended before the batch was filled",
                    format!("collected {collected} of {size} messages")
                );
            }
        }
    }

    debug!(size, "batch collected");

    Ok(pending.complete())
}
