//! Concurrency utilities shared by the coordination patterns.
//!
//! # Coordination Patterns
//!
//! ## Shutdown
//!
//! The [`shutdown`] module implements a broadcast stop signal. A single
//! [`shutdown::ShutdownTx`] stops every consumer subscribed to it, for example all batch
//! streams reading from a generator group.
//!
//! ## Deadlines
//!
//! The [`timer`] module provides an arm-on-demand timer that can sit in a `tokio::select!`
//! branch without firing until it is started. The deadline guard uses it for both fixed
//! and per-receive deadlines.
//!
//! ## Stream Processing
//!
//! The [`stream`] module adapts a message stream into a stream of fixed-size batches that
//! gives the stop signal priority over new messages.

pub mod shutdown;
pub mod stream;
pub mod timer;
