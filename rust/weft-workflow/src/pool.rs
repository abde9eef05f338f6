//! A fixed-size worker pool over a job/result channel pair.
//!
//! The driver populates the job channel, closes it for submission, and
//! drains the result channel. Each of the N workers loops over the shared
//! job channel until exhaustion, sending one [`JobResult`] per [`Job`];
//! a completion barrier tracks the workers, and a closer thread shuts the
//! result channel once the barrier clears. The driver can therefore drain
//! concurrently with the workers: the drain is finite, no result is
//! dropped, and a bounded result channel never wedges the pool.

use std::sync::Arc;
use std::thread;

use weft_channel::{Receiver, Sender};
use weft_common::{Result, error::Error, verify_arg};
use weft_sync::{SharedCounter, WaitGroup};

use crate::job::{Job, JobResult};

/// A pool of N worker threads consuming one job channel and feeding one
/// result channel.
///
/// Workers apply the pool's transform to each job. A transform failure is
/// recovered locally: it becomes a failed [`JobResult`] on the result
/// channel and the worker moves on. A closed result channel, by contrast,
/// is a construction bug and brings the worker down loudly.
#[derive(Debug)]
pub struct WorkerPool {
    workers: usize,
    wait_group: WaitGroup,
    processed: Arc<SharedCounter>,
}

impl WorkerPool {
    /// Starts `workers` worker threads over the given channels.
    ///
    /// The job channel should be populated (or be in the process of being
    /// populated) and eventually closed by the driver; workers exit when it
    /// is exhausted. The pool takes over the result sender and closes it
    /// once every worker has exited.
    ///
    /// Returns an invalid-argument error when `workers` is zero.
    pub fn start<F>(
        workers: usize,
        jobs: Receiver<Job>,
        results: Sender<JobResult>,
        transform: F,
    ) -> Result<WorkerPool>
    where
        F: Fn(&Job) -> Result<i64> + Send + Sync + 'static,
    {
        verify_arg!(workers, workers >= 1);

        let wait_group = WaitGroup::new();
        let processed = Arc::new(SharedCounter::new());
        let transform = Arc::new(transform);

        wait_group.add(workers);
        for index in 0..workers {
            let jobs = jobs.clone();
            let results = results.clone();
            let processed = processed.clone();
            let transform = transform.clone();
            let done = DoneOnExit(wait_group.clone());
            thread::Builder::new()
                .name(format!("weft-worker-{index}"))
                .spawn(move || {
                    let _done = done;
                    if let Err(err) = Self::worker_loop(index, &jobs, &results, &processed, &*transform)
                    {
                        log::error!("worker {index} aborted: {err}");
                        panic!("result channel closed while the worker pool is running");
                    }
                })
                .expect("spawn worker thread");
        }

        // The result channel is closed by the pool, exactly once, after the
        // last worker has exited.
        {
            let wait_group = wait_group.clone();
            thread::Builder::new()
                .name("weft-pool-closer".to_string())
                .spawn(move || {
                    wait_group.wait();
                    log::debug!("all workers exited, closing the result channel");
                    results.close();
                })
                .expect("spawn closer thread");
        }

        log::debug!("worker pool started with {workers} workers");
        Ok(WorkerPool {
            workers,
            wait_group,
            processed,
        })
    }

    fn worker_loop<F>(
        index: usize,
        jobs: &Receiver<Job>,
        results: &Sender<JobResult>,
        processed: &SharedCounter,
        transform: &F,
    ) -> Result<()>
    where
        F: Fn(&Job) -> Result<i64>,
    {
        log::trace!("worker {index} started");
        while let Some(job) = jobs.recv() {
            let outcome = transform(&job);
            if let Err(err) = &outcome {
                log::debug!("worker {index}: job {} failed: {err}", job.id);
            }
            let result = JobResult {
                job_id: job.id,
                outcome,
            };
            if results.send(result).is_err() {
                return Err(Error::channel_closed("results"));
            }
            processed.increment();
        }
        log::trace!("worker {index}: job channel exhausted");
        Ok(())
    }

    /// Blocks until every worker has exited (the job channel is exhausted).
    pub fn wait(&self) {
        self.wait_group.wait();
    }

    /// The number of worker threads in this pool.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Total jobs processed so far, successes and failures alike.
    pub fn processed(&self) -> u64 {
        self.processed.value()
    }
}

/// Reports worker completion even when the worker panics, so the closer
/// thread still closes the result channel and the driver's drain ends.
struct DoneOnExit(WaitGroup);

impl Drop for DoneOnExit {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// Aggregate outcome counts of a fully drained result channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl DrainSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Drains the result channel to exhaustion, counting successes and
/// failures.
///
/// Blocks until the channel is closed and drained; with a [`WorkerPool`]
/// attached to the sending side that happens once all jobs are processed.
pub fn drain_summary(results: &Receiver<JobResult>) -> DrainSummary {
    let mut summary = DrainSummary::default();
    for result in results.drain() {
        match &result.outcome {
            Ok(_) => summary.succeeded += 1,
            Err(err) => {
                log::debug!("job {} reported failure: {err}", result.job_id);
                summary.failed += 1;
            }
        }
    }
    log::info!(
        "drained {} results: {} succeeded, {} failed",
        summary.total(),
        summary.succeeded,
        summary.failed
    );
    summary
}
