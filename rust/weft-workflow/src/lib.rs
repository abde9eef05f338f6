//! Coordinated concurrent execution over weft channels.
//!
//! This crate composes the channel, counter and barrier primitives into the
//! two coordination patterns of the workspace:
//!
//! # Key Components
//!
//! ## Worker Pool
//!
//! - [`Job`] / [`JobResult`] - the unit of work and its outcome
//! - [`WorkerPool`] - N worker threads pulling from one job channel and
//!   pushing to one result channel, with a completion barrier that closes
//!   the result channel once every worker has exited
//! - [`drain_summary`] - driver-side aggregation of a result stream into
//!   success/failure counts
//!
//! ## Selective Generator
//!
//! - [`FibonacciGenerator`] - a cooperative loop racing an output send, a
//!   cancellation signal and an inactivity timeout, terminating on whichever
//!   fires first ([`Termination`])
//!
//! # Liveness
//!
//! The pool's result channel is closed by the pool itself, not the driver,
//! so a driver draining results concurrently never blocks forever and never
//! drops a result - even when the result channel is smaller than the number
//! of jobs in flight.

pub mod generator;
pub mod job;
pub mod pool;

pub use generator::{FibonacciGenerator, Termination};
pub use job::{Job, JobResult};
pub use pool::{DrainSummary, WorkerPool, drain_summary};
