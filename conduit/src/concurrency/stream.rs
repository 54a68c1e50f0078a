use core::pin::Pin;
use core::task::{Context, Poll};
use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use pin_project_lite::pin_project;
use tracing::info;

use conduit_config::shared::SequencerConfig;

use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::error::ConduitResult;
use crate::sequencer::Batch;
use crate::types::Message;

pin_project! {
    /// A stream adapter that groups messages into batches of a fixed size.
    ///
    /// A batch is emitted as soon as it holds `batch_size` messages. When the inner stream
    /// ends, the remaining messages are emitted as a final, shorter batch. A shutdown signal
    /// takes priority over new messages and returns what was collected so far.
    #[must_use = "streams do nothing unless polled"]
    pub struct BatchStream<S> {
        #[pin]
        stream: S,
        shutdown: BoxFuture<'static, ()>,
        items: Vec<Message>,
        batch_size: usize,
        inner_stream_ended: bool,
        stream_stopped: bool,
    }
}

impl<S> BatchStream<S>
where
    S: Stream<Item = Message>,
{
    /// Creates a new [`BatchStream`], validating the batch size.
    pub fn wrap(
        stream: S,
        config: &SequencerConfig,
        shutdown_rx: ShutdownRx,
    ) -> ConduitResult<Self> {
        config.validate()?;

        let mut shutdown_rx = shutdown_rx;
        let shutdown = async move { shutdown_rx.wait_for_shutdown().await }.boxed();

        Ok(BatchStream {
            stream,
            shutdown,
            items: Vec::with_capacity(config.batch_size),
            batch_size: config.batch_size,
            inner_stream_ended: false,
            stream_stopped: false,
        })
    }
}

impl<S> Stream for BatchStream<S>
where
    S: Stream<Item = Message>,
{
    type Item = ShutdownResult<Batch, Batch>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.inner_stream_ended || *this.stream_stopped {
            return Poll::Ready(None);
        }

        loop {
            // Shutdown is checked before every message so that a busy stream cannot starve it.
            if this.shutdown.poll_unpin(cx).is_ready() {
                info!(
                    buffered_messages = this.items.len(),
                    "batch stream stopped due to shutdown signal"
                );
                *this.stream_stopped = true;

                return Poll::Ready(Some(ShutdownResult::Shutdown(Batch::new(
                    std::mem::take(this.items),
                ))));
            }

            match this.stream.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(message)) => {
                    this.items.push(message);

                    if this.items.len() >= *this.batch_size {
                        let batch = std::mem::replace(
                            this.items,
                            Vec::with_capacity(*this.batch_size),
                        );
                        return Poll::Ready(Some(ShutdownResult::Ok(Batch::new(batch))));
                    }
                }
                Poll::Ready(None) => {
                    *this.inner_stream_ended = true;

                    if this.items.is_empty() {
                        return Poll::Ready(None);
                    }

                    return Poll::Ready(Some(ShutdownResult::Ok(Batch::new(std::mem::take(
                        this.items,
                    )))));
                }
            }
        }
    }
}
