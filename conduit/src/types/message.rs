use core::pin::Pin;
use core::task::{Context, Poll, ready};
use futures::Stream;
use futures::future::poll_fn;
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::trace;

/// Capacity of every message hand-off channel.
///
/// Tokio channels cannot be unbuffered, so a single slot is the closest to a rendezvous.
/// The acknowledgment gate keeps a generator from running ahead of its consumer.
pub(crate) const HANDOFF_CAPACITY: usize = 1;

/// Receiving side of a message acknowledgment, held by the originating generator.
pub(crate) type AckRx = oneshot::Receiver<()>;

/// A labelled message paired with its private acknowledgment signal.
///
/// The acknowledgment can be signalled exactly once, by whoever ends up owning the
/// message, through [`Message::acknowledge`]. Dropping a message without acknowledging it
/// parks its generator until the generator is quit.
#[must_use = "a message must be acknowledged, otherwise its generator stalls"]
pub struct Message {
    content: String,
    ack_tx: oneshot::Sender<()>,
}

impl Message {
    /// Creates a message together with the receiver its generator waits on.
    pub(crate) fn new(content: String) -> (Self, AckRx) {
        let (ack_tx, ack_rx) = oneshot::channel();
        (Self { content, ack_tx }, ack_rx)
    }

    /// Returns the message content, formatted as `"<label> <index>"` by generators.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Signals the originating generator that it may produce its next message.
    ///
    /// Returns `false` when the generator has already stopped.
    pub fn acknowledge(self) -> bool {
        self.ack_tx.send(()).is_ok()
    }

    /// Returns `true` when the originating generator stopped before this message was
    /// acknowledged.
    pub fn is_abandoned(&self) -> bool {
        self.ack_tx.is_closed()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("content", &self.content)
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

/// Creates a hand-off channel whose receiving side is a [`MessageStream`].
pub(crate) fn message_channel() -> (mpsc::Sender<Message>, MessageStream) {
    let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
    (tx, MessageStream::new(rx))
}

/// Receive-only stream of [`Message`]s.
///
/// The stream ends once every producer feeding it has stopped. Messages that were still
/// buffered when their generator stopped are discarded on receipt, so nothing is observed
/// from a generator after it confirmed a quit request.
///
/// A stream produced by a multiplexer owns the forwarding tasks feeding it; dropping the
/// stream aborts them.
pub struct MessageStream {
    rx: mpsc::Receiver<Message>,
    forwarders: Option<JoinSet<()>>,
}

impl MessageStream {
    pub(crate) fn new(rx: mpsc::Receiver<Message>) -> Self {
        Self {
            rx,
            forwarders: None,
        }
    }

    pub(crate) fn with_forwarders(rx: mpsc::Receiver<Message>, forwarders: JoinSet<()>) -> Self {
        Self {
            rx,
            forwarders: Some(forwarders),
        }
    }

    /// Receives the next live message, or `None` once every producer has stopped.
    pub async fn recv(&mut self) -> Option<Message> {
        poll_fn(|cx| self.poll_recv(cx)).await
    }

    /// Polls for the next live message.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        loop {
            match ready!(self.rx.poll_recv(cx)) {
                Some(message) if message.is_abandoned() => {
                    trace!(content = %message.content, "discarding message of a stopped generator");
                }
                other => return Poll::Ready(other),
            }
        }
    }

    /// Returns the number of forwarding tasks still running for a merged stream.
    pub fn active_forwarders(&self) -> usize {
        self.forwarders.as_ref().map_or(0, JoinSet::len)
    }
}

impl fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("forwarders", &self.active_forwarders())
            .finish()
    }
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}
