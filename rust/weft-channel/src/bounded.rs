//! A bounded, blocking, multi-producer multi-consumer channel.
//!
//! The channel holds at most `capacity` items in a FIFO buffer. Senders block
//! while the buffer is full; receivers block while it is empty. Items are
//! received in the order their sends completed, across any number of
//! concurrent senders and receivers.
//!
//! ## Closing
//!
//! A channel is closed exactly once, through [`Sender::close`]. After close:
//!
//! - every send fails with [`SendError`], handing the item back to the caller
//! - items buffered before the close remain receivable until drained
//! - a receive on the drained channel returns `None` (exhaustion is an
//!   expected end-of-stream signal, not an error)
//! - closing again panics; a double close indicates a construction bug
//!
//! Dropping all senders does *not* close the channel. A receiver blocked on
//! an abandoned open channel blocks indefinitely, so the owning side must
//! close when it is done submitting.
//!
//! ## Rendezvous
//!
//! With `capacity == 0` the channel buffers nothing: a send completes only
//! while a receiver is parked inside [`Receiver::recv`], and it does not
//! return until that receiver has taken the item, so the two calls overlap
//! in time.
//!
//! ## Fairness
//!
//! Wake order among blocked senders (or receivers) is whatever the platform
//! condition variable provides. It is not a strict FIFO ticket queue, but no
//! waiter is left parked while capacity (or data) is available and others
//! make progress.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, Weak};

use thiserror::Error;

use crate::select::SelectWaker;

/// Creates a bounded channel with the given capacity, returning the
/// sender/receiver halves.
///
/// Both halves can be cloned freely; all clones operate on the same channel.
/// A `capacity` of zero creates a rendezvous channel (see the module docs).
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let chan = Arc::new(Chan::new(capacity));
    (Sender(chan.clone()), Receiver(chan))
}

/// The sending half of a [`bounded`] channel.
pub struct Sender<T>(Arc<Chan<T>>);

impl<T> Sender<T> {
    /// Sends an item, blocking while the channel is full.
    ///
    /// Returns `Err(SendError(item))` if the channel is closed, either at the
    /// time of the call or while this sender is blocked waiting for space.
    pub fn send(&self, item: T) -> Result<(), SendError<T>> {
        self.0.send(item)
    }

    /// Attempts to send an item without blocking.
    ///
    /// Returns `Err(TrySendError::Full(item))` when the buffer is at capacity
    /// (or, on a rendezvous channel, when no receiver is currently parked),
    /// and `Err(TrySendError::Closed(item))` when the channel is closed.
    pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        self.0.try_send(item)
    }

    /// Closes the channel.
    ///
    /// Buffered items remain receivable; subsequent sends fail. Blocked
    /// senders and receivers are woken.
    ///
    /// # Panics
    ///
    /// Panics if the channel is already closed.
    pub fn close(&self) {
        self.0.close()
    }

    /// Returns `true` once the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// The channel capacity this sender was created with.
    pub fn capacity(&self) -> usize {
        self.0.capacity
    }

    /// Number of items currently buffered. A rendezvous channel never
    /// buffers, so this is always zero for `capacity() == 0`.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a [`SelectWaker`] to be notified on every observable state
    /// change of this channel (item enqueued or dequeued, close, rendezvous
    /// handoff). The registration is weak; a dropped waker is pruned.
    pub fn watch(&self, waker: &Arc<SelectWaker>) {
        self.0.watch(waker)
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Sender(self.0.clone())
    }
}

/// The receiving half of a [`bounded`] channel.
pub struct Receiver<T>(Arc<Chan<T>>);

impl<T> Receiver<T> {
    /// Receives the next item, blocking while the channel is empty and open.
    ///
    /// Returns `None` once the channel is closed and drained. This is the
    /// normal end-of-stream signal, not an error.
    pub fn recv(&self) -> Option<T> {
        self.0.recv()
    }

    /// Attempts to receive an item without blocking.
    ///
    /// Returns `Err(TryRecvError::Empty)` when the channel is open but has
    /// nothing to deliver, and `Err(TryRecvError::Closed)` once it is closed
    /// and drained. On a rendezvous channel this only succeeds while a
    /// paired send is in flight.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.0.try_recv()
    }

    /// Returns a finite, non-restartable iterator over the remaining items.
    ///
    /// Each `next()` is a blocking [`recv`](Self::recv); the iterator ends
    /// when the channel is closed and drained.
    pub fn drain(&self) -> Drain<'_, T> {
        Drain(self)
    }

    /// Returns `true` once the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// The channel capacity this receiver was created with.
    pub fn capacity(&self) -> usize {
        self.0.capacity
    }

    /// Number of items currently buffered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a [`SelectWaker`] to be notified on every observable state
    /// change of this channel. See [`Sender::watch`].
    pub fn watch(&self, waker: &Arc<SelectWaker>) {
        self.0.watch(waker)
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Receiver(self.0.clone())
    }
}

/// A blocking iterator over the remaining items of a channel.
///
/// Returned by [`Receiver::drain`]. Finite: ends once the channel is closed
/// and drained.
pub struct Drain<'a, T>(&'a Receiver<T>);

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.recv()
    }
}

/// An error returned from [`Sender::send`]: the channel was closed. The
/// unsent item is handed back to the caller.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SendError<T>(pub T);

impl<T> std::fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "send on closed channel")
    }
}

impl<T: std::fmt::Debug> std::error::Error for SendError<T> {}

/// An error returned from [`Sender::try_send`]. Both variants hand the
/// unsent item back to the caller.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TrySendError<T> {
    /// The buffer is at capacity (or no receiver is parked, for a
    /// rendezvous channel).
    Full(T),
    /// The channel is closed.
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Recovers the item that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(item) | TrySendError::Closed(item) => item,
        }
    }
}

impl<T> std::fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "channel is full"),
            TrySendError::Closed(_) => write!(f, "send on closed channel"),
        }
    }
}

impl<T: std::fmt::Debug> std::error::Error for TrySendError<T> {}

/// An error returned from [`Receiver::try_recv`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum TryRecvError {
    /// The channel is open but has nothing to deliver right now.
    #[error("channel is empty")]
    Empty,
    /// The channel is closed and drained; no item will ever arrive.
    #[error("channel is closed and drained")]
    Closed,
}

/// The shared core of a channel: state behind a mutex, plus the condition
/// variables used by the blocking paths.
struct Chan<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
    // Rendezvous only: wakes a sender once its deposited item was taken.
    handoff_taken: Condvar,
}

struct State<T> {
    buffer: VecDeque<T>,
    closed: bool,
    // Rendezvous bookkeeping: receivers parked in `recv`, the in-flight
    // handoff slot, and whether a blocking sender is waiting on that slot.
    recv_waiting: usize,
    handoff: Option<T>,
    handoff_active: bool,
    watchers: Vec<Weak<SelectWaker>>,
}

impl<T> State<T> {
    /// Notifies every registered select waker, pruning the dead ones.
    fn notify_watchers(&mut self) {
        self.watchers.retain(|watcher| match watcher.upgrade() {
            Some(waker) => {
                waker.notify();
                true
            }
            None => false,
        });
    }
}

impl<T> Chan<T> {
    fn new(capacity: usize) -> Chan<T> {
        Chan {
            state: Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity),
                closed: false,
                recv_waiting: 0,
                handoff: None,
                handoff_active: false,
                watchers: Vec::new(),
            }),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            handoff_taken: Condvar::new(),
        }
    }

    fn send(&self, item: T) -> Result<(), SendError<T>> {
        if self.capacity == 0 {
            return self.send_rendezvous(item);
        }

        let mut state = self.state.lock().unwrap();
        loop {
            if state.closed {
                return Err(SendError(item));
            }
            if state.buffer.len() < self.capacity {
                break;
            }
            state = self.not_full.wait(state).unwrap();
        }

        state.buffer.push_back(item);
        state.notify_watchers();

        // Drop the lock before notifying to reduce contention.
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(TrySendError::Closed(item));
        }

        if self.capacity == 0 {
            // A rendezvous deposit requires a free slot and a parked receiver.
            if state.handoff.is_some() || state.handoff_active || state.recv_waiting == 0 {
                return Err(TrySendError::Full(item));
            }
            state.handoff = Some(item);
            state.notify_watchers();
            drop(state);
            self.not_empty.notify_one();
            return Ok(());
        }

        if state.buffer.len() >= self.capacity {
            return Err(TrySendError::Full(item));
        }
        state.buffer.push_back(item);
        state.notify_watchers();
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Rendezvous send: deposit only while a receiver is parked, then wait
    /// until that receiver has taken the item.
    fn send_rendezvous(&self, item: T) -> Result<(), SendError<T>> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.closed {
                return Err(SendError(item));
            }
            if state.handoff.is_none() && !state.handoff_active && state.recv_waiting > 0 {
                break;
            }
            state = self.not_full.wait(state).unwrap();
        }

        state.handoff = Some(item);
        state.handoff_active = true;
        state.notify_watchers();
        self.not_empty.notify_one();

        while state.handoff.is_some() && !state.closed {
            state = self.handoff_taken.wait(state).unwrap();
        }

        // The channel may have been closed under us: reclaim an untaken item.
        let leftover = state.handoff.take();
        state.handoff_active = false;
        state.notify_watchers();
        drop(state);
        self.not_full.notify_one();

        match leftover {
            None => Ok(()),
            Some(item) => Err(SendError(item)),
        }
    }

    fn recv(&self) -> Option<T> {
        if self.capacity == 0 {
            return self.recv_rendezvous();
        }

        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.buffer.pop_front() {
                state.notify_watchers();
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self.not_empty.wait(state).unwrap();
        }
    }

    fn recv_rendezvous(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        state.recv_waiting += 1;
        // A parked receiver is what senders (and select loops) wait for.
        state.notify_watchers();
        self.not_full.notify_one();

        loop {
            if let Some(item) = state.handoff.take() {
                state.recv_waiting -= 1;
                state.notify_watchers();
                self.handoff_taken.notify_all();
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                state.recv_waiting -= 1;
                return None;
            }
            state = self.not_empty.wait(state).unwrap();
        }
    }

    fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.state.lock().unwrap();

        if self.capacity == 0 {
            if let Some(item) = state.handoff.take() {
                state.notify_watchers();
                self.handoff_taken.notify_all();
                drop(state);
                self.not_full.notify_one();
                return Ok(item);
            }
        } else if let Some(item) = state.buffer.pop_front() {
            state.notify_watchers();
            drop(state);
            self.not_full.notify_one();
            return Ok(item);
        }

        if state.closed {
            Err(TryRecvError::Closed)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        assert!(!state.closed, "close of an already closed channel");
        state.closed = true;
        state.notify_watchers();
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
        self.handoff_taken.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn len(&self) -> usize {
        self.state.lock().unwrap().buffer.len()
    }

    fn watch(&self, waker: &Arc<SelectWaker>) {
        let mut state = self.state.lock().unwrap();
        state.watchers.push(Arc::downgrade(waker));
    }
}
