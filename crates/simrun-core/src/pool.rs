//! Fixed-size worker pool with a drain barrier
//!
//! `worker_count` OS threads pull [`Job`]s from one shared FIFO channel and run
//! them through a [`JobExecutor`]. Every submission gets a ticket; `drain()`
//! waits until no ticket issued before the call is outstanding, which makes it
//! usable as a phase barrier any number of times.
//!
//! A failing or panicking job is logged and counted; the worker moves on to
//! the next job.

use crate::error::PoolError;
use crate::job::{Job, JobExecutor, ProcessExecutor};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted by `submit`
    pub submitted: u64,
    /// Jobs that completed successfully
    pub succeeded: u64,
    /// Jobs that failed to spawn, exited nonzero or panicked
    pub failed: u64,
    /// Number of `drain` calls
    pub drains: u64,
}

impl PoolStats {
    /// Jobs that have finished either way
    #[inline]
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Host parallelism, falling back to a single worker
#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

struct Ticketed {
    ticket: u64,
    job: Job,
}

struct PoolState {
    sender: Option<Sender<Ticketed>>,
    next_ticket: u64,
    outstanding: BTreeSet<u64>,
    stats: PoolStats,
}

struct Shared {
    state: Mutex<PoolState>,
    settled: Condvar,
}

impl Shared {
    fn complete(&self, ticket: u64, succeeded: bool) {
        let mut state = self.state.lock();
        state.outstanding.remove(&ticket);
        if succeeded {
            state.stats.succeeded += 1;
        } else {
            state.stats.failed += 1;
        }
        self.settled.notify_all();
    }
}

/// Fixed-size pool of worker threads
pub struct WorkerPool {
    worker_count: usize,
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool that runs jobs as child processes
    ///
    /// # Errors
    /// - `PoolError::SpawnWorker` if a worker thread cannot be started
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        Self::with_executor(worker_count, Arc::new(ProcessExecutor))
    }

    /// Create a pool with a custom executor
    ///
    /// A `worker_count` of zero is raised to one.
    ///
    /// # Errors
    /// - `PoolError::SpawnWorker` if a worker thread cannot be started
    pub fn with_executor(
        worker_count: usize,
        executor: Arc<dyn JobExecutor>,
    ) -> Result<Self, PoolError> {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = channel::unbounded();
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                sender: Some(sender),
                next_ticket: 0,
                outstanding: BTreeSet::new(),
                stats: PoolStats::default(),
            }),
            settled: Condvar::new(),
        });

        let pool = Self {
            worker_count,
            shared,
            workers: Mutex::new(Vec::with_capacity(worker_count)),
        };

        for id in 0..worker_count {
            let receiver = receiver.clone();
            let shared = Arc::clone(&pool.shared);
            let executor = Arc::clone(&executor);
            let handle = thread::Builder::new()
                .name(format!("simrun-worker-{id}"))
                .spawn(move || worker_loop(id, &receiver, &shared, executor.as_ref()))
                .map_err(PoolError::SpawnWorker)?;
            pool.workers.lock().push(handle);
        }

        tracing::debug!("worker pool started with {worker_count} workers");
        Ok(pool)
    }

    /// Number of worker threads
    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Enqueue a job
    ///
    /// Never blocks beyond lock contention.
    ///
    /// # Errors
    /// - `PoolError::Closed` if called after `shutdown()`
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock();
        let ticket = state.next_ticket;
        let sender = state.sender.as_ref().ok_or(PoolError::Closed)?;
        tracing::debug!(ticket, "queued: {job}");
        sender
            .send(Ticketed { ticket, job })
            .map_err(|_| PoolError::Closed)?;
        state.next_ticket += 1;
        state.outstanding.insert(ticket);
        state.stats.submitted += 1;
        Ok(())
    }

    /// Block until every job submitted before this call has completed
    ///
    /// The pool stays open afterwards.
    pub fn drain(&self) {
        let mut state = self.shared.state.lock();
        state.stats.drains += 1;
        let horizon = state.next_ticket;
        while state
            .outstanding
            .first()
            .is_some_and(|ticket| *ticket < horizon)
        {
            self.shared.settled.wait(&mut state);
        }
    }

    /// Stop accepting jobs and wait for queued and running ones to finish
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        let sender = self.shared.state.lock().sender.take();
        let first_call = sender.is_some();
        drop(sender);

        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked outside job execution");
            }
        }
        if first_call {
            tracing::debug!("worker pool shut down");
        }
    }

    /// Whether `shutdown()` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().sender.is_none()
    }

    /// Jobs submitted but not yet completed
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().outstanding.len()
    }

    /// Snapshot of pool statistics
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.state.lock().stats
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    id: usize,
    receiver: &Receiver<Ticketed>,
    shared: &Shared,
    executor: &dyn JobExecutor,
) {
    while let Ok(Ticketed { ticket, job }) = receiver.recv() {
        let succeeded = match panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&job))) {
            Ok(Ok(outcome)) => {
                tracing::debug!(worker = id, ticket, "finished in {:?}: {job}", outcome.elapsed);
                true
            }
            Ok(Err(err)) => {
                tracing::warn!(worker = id, ticket, "job failed: {err}");
                false
            }
            Err(_) => {
                tracing::error!(worker = id, ticket, "job panicked: {job}");
                false
            }
        };
        shared.complete(ticket, succeeded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::job::{CommandSpec, JobOutcome};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps per job and tracks peak concurrency; fails jobs whose program is `fail`.
    #[derive(Default)]
    struct Probe {
        running: AtomicUsize,
        peak: AtomicUsize,
        finished: AtomicUsize,
    }

    impl JobExecutor for Probe {
        fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(15));
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            if job.program().to_str() == Some("panic") {
                panic!("probe asked to panic");
            }
            if job.program().to_str() == Some("fail") {
                return Err(JobError::NonZeroExit {
                    command: job.to_string(),
                    code: 1,
                });
            }
            Ok(JobOutcome {
                elapsed: Duration::from_millis(15),
            })
        }
    }

    fn job(program: &str) -> Job {
        Job::command(CommandSpec::new(program))
    }

    #[test]
    fn drain_waits_for_every_submitted_job() {
        let probe = Arc::new(Probe::default());
        let pool = WorkerPool::with_executor(3, probe.clone()).unwrap();

        for _ in 0..12 {
            pool.submit(job("ok")).unwrap();
        }
        pool.drain();

        assert_eq!(probe.finished.load(Ordering::SeqCst), 12);
        assert_eq!(pool.pending(), 0);
        assert_eq!(pool.stats().completed(), 12);
    }

    #[test]
    fn concurrency_never_exceeds_worker_count() {
        let probe = Arc::new(Probe::default());
        let pool = WorkerPool::with_executor(2, probe.clone()).unwrap();

        for _ in 0..10 {
            pool.submit(job("ok")).unwrap();
        }
        pool.drain();

        let peak = probe.peak.load(Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak concurrency was {peak}");
    }

    #[test]
    fn failures_do_not_stop_the_pool() {
        let probe = Arc::new(Probe::default());
        let pool = WorkerPool::with_executor(2, probe.clone()).unwrap();

        for idx in 0..8 {
            let program = match idx % 4 {
                0 => "fail",
                1 => "panic",
                _ => "ok",
            };
            pool.submit(job(program)).unwrap();
        }
        pool.drain();

        let stats = pool.stats();
        assert_eq!(stats.submitted, 8);
        assert_eq!(stats.failed, 4);
        assert_eq!(stats.succeeded, 4);
        assert_eq!(probe.finished.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn drain_is_reusable_as_a_barrier() {
        let probe = Arc::new(Probe::default());
        let pool = WorkerPool::with_executor(4, probe.clone()).unwrap();

        for phase in 1..=3 {
            for _ in 0..5 {
                pool.submit(job("ok")).unwrap();
            }
            pool.drain();
            assert_eq!(probe.finished.load(Ordering::SeqCst), phase * 5);
        }
        assert_eq!(pool.stats().drains, 3);
        assert!(!pool.is_closed());
    }

    #[test]
    fn drain_on_idle_pool_returns() {
        let pool = WorkerPool::with_executor(1, Arc::new(Probe::default())).unwrap();
        pool.drain();
        assert_eq!(pool.stats().drains, 1);
    }

    #[test]
    fn submit_after_shutdown_is_rejected() {
        let pool = WorkerPool::with_executor(1, Arc::new(Probe::default())).unwrap();
        pool.shutdown();
        assert!(pool.is_closed());
        assert!(matches!(pool.submit(job("ok")), Err(PoolError::Closed)));
        assert_eq!(pool.stats().submitted, 0);
    }

    #[test]
    fn shutdown_is_idempotent_and_finishes_queued_jobs() {
        let probe = Arc::new(Probe::default());
        let pool = WorkerPool::with_executor(1, probe.clone()).unwrap();
        for _ in 0..4 {
            pool.submit(job("ok")).unwrap();
        }
        pool.shutdown();
        pool.shutdown();

        assert_eq!(probe.finished.load(Ordering::SeqCst), 4);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn zero_workers_is_raised_to_one() {
        let pool = WorkerPool::with_executor(0, Arc::new(Probe::default())).unwrap();
        assert_eq!(pool.worker_count(), 1);
    }

    #[test]
    fn default_worker_count_is_positive() {
        assert!(default_worker_count() >= 1);
    }
}
