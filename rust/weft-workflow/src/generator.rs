//! A Fibonacci generator driven by a three-way select.
//!
//! Each iteration races three events and proceeds with whichever is ready
//! first: sending the current value to the consumer, a cancellation
//! message, and an inactivity timeout measured since the last successful
//! send. Selection among simultaneously-ready events is arbitrary - the
//! poll order is shuffled every round, so no branch has priority and a
//! consumer can rely on nothing beyond "one ready event fires".
//!
//! The loop never busy-waits: when no branch is ready it parks on a
//! [`SelectWaker`] registered with both channels, waking on the first state
//! change or at the timeout deadline. The deadline is re-armed after every
//! successful send and a deadline that was not reached leaves no residue in
//! later waits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use weft_channel::{Receiver, SelectWaker, Sender, TryRecvError, TrySendError};

/// Why a generator stopped. Both reasons are normal terminations,
/// distinguished for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A cancellation message arrived (or the cancellation channel closed).
    Cancelled,
    /// No send succeeded within the configured timeout.
    TimedOut,
}

/// A cooperative Fibonacci source feeding an output channel.
///
/// The generator owns its state pair `(current, next)`, starting at
/// `(0, 1)` and advancing by the recurrence on every send the consumer
/// accepts. It runs on the calling thread until cancelled or timed out;
/// cancellation is observed only at the select point, never preemptively.
pub struct FibonacciGenerator {
    output: Sender<u64>,
    cancel: Receiver<()>,
    timeout: Duration,
}

enum Branch {
    Send,
    Cancel,
}

impl FibonacciGenerator {
    /// Creates a generator over the given channels.
    ///
    /// `timeout` bounds the inactivity window: the time since the last
    /// successful send (or since `run` began) after which the generator
    /// gives up.
    pub fn new(output: Sender<u64>, cancel: Receiver<()>, timeout: Duration) -> FibonacciGenerator {
        FibonacciGenerator {
            output,
            cancel,
            timeout,
        }
    }

    /// Runs the generator loop until it terminates.
    ///
    /// # Panics
    ///
    /// Panics if the output channel is closed under the generator; closing
    /// the producing side of a stream that is still being produced is a
    /// construction bug. Cancellation is the supported way to stop.
    pub fn run(self) -> Termination {
        let waker = Arc::new(SelectWaker::new());
        self.output.watch(&waker);
        self.cancel.watch(&waker);

        let mut current: u64 = 0;
        let mut next: u64 = 1;
        let mut emitted: u64 = 0;
        let mut deadline = Instant::now() + self.timeout;

        loop {
            let mut progressed = false;
            for branch in self.poll_order() {
                match branch {
                    Branch::Cancel => match self.cancel.try_recv() {
                        Ok(()) | Err(TryRecvError::Closed) => {
                            log::debug!("generator cancelled after {emitted} values");
                            return Termination::Cancelled;
                        }
                        Err(TryRecvError::Empty) => {}
                    },
                    Branch::Send => match self.output.try_send(current) {
                        Ok(()) => {
                            let advanced = current.wrapping_add(next);
                            current = next;
                            next = advanced;
                            emitted += 1;
                            deadline = Instant::now() + self.timeout;
                            progressed = true;
                        }
                        Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Closed(_)) => {
                            panic!("generator output channel closed while running")
                        }
                    },
                }
            }

            if progressed {
                continue;
            }
            if !waker.wait_deadline(deadline) {
                log::debug!(
                    "generator timed out after {:?} of inactivity, {emitted} values emitted",
                    self.timeout
                );
                return Termination::TimedOut;
            }
        }
    }

    /// Shuffled branch order for one poll round.
    fn poll_order(&self) -> [Branch; 2] {
        if fastrand::bool() {
            [Branch::Cancel, Branch::Send]
        } else {
            [Branch::Send, Branch::Cancel]
        }
    }
}
