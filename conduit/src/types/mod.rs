//! Message types exchanged between generators and consumers.

mod message;

pub use message::{Message, MessageStream};
pub(crate) use message::{AckRx, HANDOFF_CAPACITY, message_channel};
