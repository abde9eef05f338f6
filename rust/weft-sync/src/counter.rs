//! A mutex-guarded shared counter.

use std::sync::Mutex;

/// An integer counter owning its own lock.
///
/// Every read and write happens under the lock, so no increment is ever
/// lost: after all concurrent `increment` calls complete, `value` returns
/// their exact count. Callers share the counter by reference (typically
/// `Arc<SharedCounter>`); there is no ambient global instance.
#[derive(Debug, Default)]
pub struct SharedCounter {
    value: Mutex<u64>,
}

impl SharedCounter {
    pub fn new() -> SharedCounter {
        SharedCounter::default()
    }

    /// Adds one to the counter.
    pub fn increment(&self) {
        self.add(1);
    }

    /// Adds `n` to the counter.
    pub fn add(&self, n: u64) {
        *self.value.lock().unwrap() += n;
    }

    /// Reads the counter. The returned value was current at some instant
    /// during the call.
    pub fn value(&self) -> u64 {
        *self.value.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_increment_and_read() {
        let counter = SharedCounter::new();
        assert_eq!(counter.value(), 0);
        counter.increment();
        counter.increment();
        assert_eq!(counter.value(), 2);
        counter.add(10);
        assert_eq!(counter.value(), 12);
    }

    #[test]
    fn test_reads_are_idempotent() {
        let counter = SharedCounter::new();
        counter.add(7);
        assert_eq!(counter.value(), counter.value());
    }

    #[test]
    fn test_no_increment_is_lost_under_contention() {
        const THREADS: usize = 8;
        const INCREMENTS: usize = 10_000;

        let counter = Arc::new(SharedCounter::new());
        thread::scope(|s| {
            for _ in 0..THREADS {
                let counter = counter.clone();
                s.spawn(move || {
                    for _ in 0..INCREMENTS {
                        counter.increment();
                    }
                });
            }
        });
        assert_eq!(counter.value(), (THREADS * INCREMENTS) as u64);
    }
}
