//! Bounded multi-producer, multi-consumer channels with an explicit close.
//!
//! This crate provides the message-passing layer of the weft workspace:
//!
//! - [`bounded`] - A fixed-capacity FIFO channel with blocking and
//!   non-blocking send/receive operations and a one-shot [`Sender::close`]
//!   transition. A capacity of zero turns the channel into a synchronous
//!   rendezvous where a send and its matching receive overlap in time.
//! - [`select`] - The [`SelectWaker`] latch that channels notify on every
//!   observable state change, letting a caller wait on several channels (and
//!   a deadline) at once.
//!
//! Unlike `std::sync::mpsc`, a channel here is closed by an explicit call
//! rather than by dropping the senders: the producer side decides when the
//! stream ends, and closing twice is a usage error. Items buffered at close
//! time remain receivable; a drained, closed channel reports exhaustion
//! (`None`) instead of blocking.

pub mod bounded;
pub mod select;

pub use bounded::{Drain, Receiver, SendError, Sender, TryRecvError, TrySendError, bounded};
pub use select::SelectWaker;
