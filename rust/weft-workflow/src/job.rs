//! The unit of work processed by a [`WorkerPool`](crate::WorkerPool).

use weft_common::{Result, error::Error};

/// An opaque work unit: an identifying integer and a payload.
///
/// Immutable once enqueued; consumed exactly once by exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub payload: i64,
}

impl Job {
    pub fn new(id: u64, payload: i64) -> Job {
        Job { id, payload }
    }
}

/// The outcome a worker produced from exactly one [`Job`].
///
/// A per-job processing failure travels inside [`outcome`](Self::outcome)
/// as a `JobFailed` error value; it is data, not a pool failure.
#[derive(Debug)]
pub struct JobResult {
    pub job_id: u64,
    pub outcome: Result<i64>,
}

impl JobResult {
    pub fn completed(job_id: u64, value: i64) -> JobResult {
        JobResult {
            job_id,
            outcome: Ok(value),
        }
    }

    pub fn failed(job_id: u64, message: impl Into<String>) -> JobResult {
        JobResult {
            job_id,
            outcome: Err(Error::job_failed(job_id, message)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
