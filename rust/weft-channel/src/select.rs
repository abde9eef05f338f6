//! A latched wake-up event for waiting on several channels at once.
//!
//! A [`SelectWaker`] is registered with one or more channels through
//! [`Sender::watch`](crate::Sender::watch) / [`Receiver::watch`](crate::Receiver::watch).
//! Every observable state change of a watched channel sets the latch and
//! wakes the parked waiter. A select loop is then a plain pattern:
//!
//! 1. poll every branch non-blockingly (`try_send` / `try_recv`);
//! 2. if none is ready, park on [`wait_deadline`](SelectWaker::wait_deadline);
//! 3. on wake-up (or deadline), re-poll.
//!
//! Because the latch is persistent, a notification that lands between the
//! poll and the park is observed by the next `wait_deadline` call rather
//! than lost. A deadline that fires leaves the latch untouched, so a stale
//! timeout never bleeds into a later wait.

use std::sync::{Condvar, Mutex};
use std::time::Instant;

/// A latched, level-triggered wake-up event.
///
/// `notify` sets the latch and wakes all waiters; a successful wait consumes
/// the latch. The waker carries no payload - after waking, the owner re-polls
/// the watched channels to find out what changed.
pub struct SelectWaker {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl SelectWaker {
    pub fn new() -> SelectWaker {
        SelectWaker {
            signaled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Sets the latch and wakes every parked waiter.
    ///
    /// Safe to call from any thread, any number of times; notifications
    /// coalesce into a single latch.
    pub fn notify(&self) {
        let mut signaled = self.signaled.lock().unwrap();
        *signaled = true;
        self.condvar.notify_all();
    }

    /// Parks the caller until the latch is set or the deadline passes.
    ///
    /// Returns `true` when a notification was observed (the latch is
    /// consumed), `false` when the deadline passed with the latch clear.
    pub fn wait_deadline(&self, deadline: Instant) -> bool {
        let mut signaled = self.signaled.lock().unwrap();
        while !*signaled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self.condvar.wait_timeout(signaled, deadline - now).unwrap();
            signaled = guard;
        }
        *signaled = false;
        true
    }

    /// Clears the latch, returning whether it was set.
    pub fn consume(&self) -> bool {
        std::mem::replace(&mut *self.signaled.lock().unwrap(), false)
    }
}

impl Default for SelectWaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounded;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_notify_before_wait_is_latched() {
        let waker = SelectWaker::new();
        waker.notify();
        assert!(waker.wait_deadline(Instant::now() + Duration::from_millis(1)));
        // Consumed: the next wait times out.
        assert!(!waker.wait_deadline(Instant::now() + Duration::from_millis(1)));
    }

    #[test]
    fn test_wait_deadline_times_out() {
        let waker = SelectWaker::new();
        let started = Instant::now();
        assert!(!waker.wait_deadline(started + Duration::from_millis(50)));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_notify_wakes_parked_waiter() {
        let waker = Arc::new(SelectWaker::new());
        let waker2 = waker.clone();
        let handle = thread::spawn(move || {
            waker2.wait_deadline(Instant::now() + Duration::from_secs(5))
        });

        thread::sleep(Duration::from_millis(30));
        waker.notify();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_consume() {
        let waker = SelectWaker::new();
        assert!(!waker.consume());
        waker.notify();
        assert!(waker.consume());
        assert!(!waker.consume());
    }

    #[test]
    fn test_channel_send_wakes_watcher() {
        let (tx, rx) = bounded::<i32>(2);
        let waker = Arc::new(SelectWaker::new());
        rx.watch(&waker);

        let handle = {
            let waker = waker.clone();
            thread::spawn(move || waker.wait_deadline(Instant::now() + Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(30));
        tx.send(1).unwrap();
        assert!(handle.join().unwrap());
        assert_eq!(rx.recv(), Some(1));
    }

    #[test]
    fn test_channel_space_wakes_watcher() {
        let (tx, rx) = bounded::<i32>(1);
        tx.send(1).unwrap();

        let waker = Arc::new(SelectWaker::new());
        tx.watch(&waker);
        waker.consume();

        let handle = {
            let waker = waker.clone();
            thread::spawn(move || waker.wait_deadline(Instant::now() + Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(30));
        // Dequeuing frees capacity, which is a state change senders wait on.
        assert_eq!(rx.recv(), Some(1));
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_close_wakes_watcher() {
        let (tx, rx) = bounded::<i32>(1);
        let waker = Arc::new(SelectWaker::new());
        rx.watch(&waker);

        tx.close();
        assert!(waker.wait_deadline(Instant::now() + Duration::from_millis(100)));
    }
}
