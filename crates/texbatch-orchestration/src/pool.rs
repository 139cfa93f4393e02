//! Bounded worker pool: submit N jobs, block until N results arrived.
//!
//! Jobs run on a fixed-width rayon pool and report back over a crossbeam
//! channel. The submitting thread drains the channel with a plain
//! blocking receive, so it never runs pool work itself while it waits.
//! A pool worker waiting on a nested pool therefore keeps its slot and the
//! outer width bounds how many jobs are in flight.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use rayon::{ThreadPool, ThreadPoolBuilder};

/// Pool construction failure.
#[derive(Debug, thiserror::Error)]
#[error("failed to create {name} pool with {width} workers: {source}")]
pub struct PoolError {
    name: &'static str,
    width: usize,
    #[source]
    source: rayon::ThreadPoolBuildError,
}

/// A job that panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFault {
    pub message: String,
}

impl TaskFault {
    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked".to_string()
        };
        Self { message }
    }
}

impl fmt::Display for TaskFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task panicked: {}", self.message)
    }
}

/// Fixed-width pool of OS threads.
pub struct WorkerPool {
    pool: ThreadPool,
    name: &'static str,
}

impl WorkerPool {
    /// Create a pool with `width` workers (at least one).
    pub fn new(name: &'static str, width: usize) -> Result<Self, PoolError> {
        let width = width.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(move |i| format!("{name}-{i}"))
            .build()
            .map_err(|source| PoolError {
                name,
                width,
                source,
            })?;
        Ok(Self { pool, name })
    }

    /// Number of workers.
    #[must_use]
    pub fn width(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every job and hand each result to `on_complete` as it finishes.
    ///
    /// `on_complete` runs on the calling thread, one result at a time, in
    /// completion order; its first argument is the job's position in
    /// `jobs`. A panicking job is reported as a [`TaskFault`]. Returns the
    /// number of results delivered, which always equals `jobs.len()`.
    pub fn run_all<T, F, C>(&self, jobs: Vec<F>, mut on_complete: C) -> usize
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnMut(usize, Result<T, TaskFault>),
    {
        let submitted = jobs.len();
        let (tx, rx) = crossbeam_channel::unbounded();

        for (index, job) in jobs.into_iter().enumerate() {
            let tx = tx.clone();
            self.pool.spawn(move || {
                let result =
                    panic::catch_unwind(AssertUnwindSafe(job)).map_err(|p| TaskFault::from_panic(&*p));
                // The receiver outlives every sender, so this cannot fail.
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let mut delivered = 0;
        for (index, result) in &rx {
            on_complete(index, result);
            delivered += 1;
        }
        tracing::debug!(pool = self.name, submitted, delivered, "pool drained");
        delivered
    }
}
