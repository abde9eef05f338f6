//! A completion barrier over a count of outstanding participants.

use std::sync::{Arc, Condvar, Mutex};

/// A barrier that blocks waiters until every registered participant has
/// reported completion.
///
/// The owner calls [`add`](Self::add) once per participant before starting
/// it; each participant calls [`done`](Self::done) exactly once on exit;
/// [`wait`](Self::wait) blocks until the outstanding count reaches zero.
/// Clones share the same barrier.
///
/// The count never goes negative: a `done` without a matching `add` is a
/// construction bug and panics.
pub struct WaitGroup {
    inner: Arc<Inner>,
}

struct Inner {
    count: Mutex<usize>,
    all_done: Condvar,
}

impl WaitGroup {
    pub fn new() -> WaitGroup {
        WaitGroup {
            inner: Arc::new(Inner {
                count: Mutex::new(0),
                all_done: Condvar::new(),
            }),
        }
    }

    /// Registers `n` additional participants.
    pub fn add(&self, n: usize) {
        *self.inner.count.lock().unwrap() += n;
    }

    /// Reports one participant as complete.
    ///
    /// # Panics
    ///
    /// Panics if called more times than [`add`](Self::add) registered.
    pub fn done(&self) {
        let mut count = self.inner.count.lock().unwrap();
        assert!(
            *count > 0,
            "WaitGroup::done called more times than WaitGroup::add"
        );
        *count -= 1;
        if *count == 0 {
            self.inner.all_done.notify_all();
        }
    }

    /// Blocks until the outstanding count reaches zero. Returns immediately
    /// when no participants are registered.
    pub fn wait(&self) {
        let count = self.inner.count.lock().unwrap();
        let _guard = self
            .inner
            .all_done
            .wait_while(count, |count| *count > 0)
            .unwrap();
    }
}

impl Clone for WaitGroup {
    fn clone(&self) -> Self {
        WaitGroup {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitGroup")
            .field("count", &*self.inner.count.lock().unwrap())
            .finish()
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_immediately_when_idle() {
        let wg = WaitGroup::new();
        wg.wait();
    }

    #[test]
    fn test_wait_blocks_until_all_done() {
        const PARTICIPANTS: usize = 4;

        let wg = WaitGroup::new();
        wg.add(PARTICIPANTS);
        let finished = Arc::new(AtomicUsize::new(0));

        for i in 0..PARTICIPANTS {
            let wg = wg.clone();
            let finished = finished.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10 * (i as u64 + 1)));
                finished.fetch_add(1, Ordering::SeqCst);
                wg.done();
            });
        }

        wg.wait();
        assert_eq!(finished.load(Ordering::SeqCst), PARTICIPANTS);
    }

    #[test]
    fn test_add_while_waiting() {
        let wg = WaitGroup::new();
        wg.add(1);

        let waiter = {
            let wg = wg.clone();
            thread::spawn(move || wg.wait())
        };

        thread::sleep(Duration::from_millis(30));
        wg.done();
        waiter.join().unwrap();
    }

    #[test]
    #[should_panic(expected = "WaitGroup::done called more times than WaitGroup::add")]
    fn test_done_underflow_panics() {
        let wg = WaitGroup::new();
        wg.done();
    }

    #[test]
    fn test_each_add_matched_by_one_done() {
        let wg = WaitGroup::new();
        wg.add(2);
        wg.done();
        let waiter = {
            let wg = wg.clone();
            thread::spawn(move || wg.wait())
        };
        thread::sleep(Duration::from_millis(20));
        wg.done();
        waiter.join().unwrap();
    }
}
