//! Fixed-size worker pool
//!
//! ```text
//!   submit(job) ──► ┌──────────────────────────────┐
//!                   │   JobQueue (mutex + condvar) │
//!                   └──────┬──────────┬────────────┘
//!                          │          │
//!                    ┌─────▼────┐ ┌───▼──────┐       ┌──────────┐
//!                    │ Worker 0 │ │ Worker 1 │  ...  │ Worker N │
//!                    └─────┬────┘ └───┬──────┘       └────┬─────┘
//!                          │          │                   │
//!                          ▼          ▼                   ▼
//!                    JobHandle<T> (one-shot channel per job)
//! ```
//!
//! The pool bounds concurrent execution to its worker count. Queued work is
//! unbounded unless a queue capacity is configured. `shutdown` (or drop)
//! closes the queue, lets workers drain every queued job, and joins them.

pub mod handle;
pub mod queue;
pub mod worker;

pub use handle::{await_all, JobHandle};
pub use queue::{JobQueue, QueueStats, Task, TaskOutcome};
pub use worker::{Worker, WorkerStats};

use crate::error::{JobError, WorkerError};
use crossbeam_channel::bounded;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads (at least 1)
    pub workers: usize,

    /// Maximum queued-but-unstarted jobs (`None` = unbounded)
    pub queue_capacity: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            queue_capacity: None,
        }
    }
}

impl PoolConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }
}

/// Totals reported when the pool is shut down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub workers: usize,
    pub jobs_completed: u64,
    pub jobs_panicked: u64,
}

/// Pool of worker threads consuming one shared job queue
pub struct TaskPool {
    queue: Arc<JobQueue>,
    workers: Vec<Worker>,
    next_id: AtomicU64,
}

impl TaskPool {
    /// Spawn the workers
    pub fn new(config: PoolConfig) -> Result<Self, WorkerError> {
        let queue = Arc::new(JobQueue::new(config.queue_capacity));
        let count = config.workers.max(1);

        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(count),
            next_id: AtomicU64::new(0),
        };

        for id in 0..count {
            // On failure, drop joins whatever was already spawned
            let worker = Worker::spawn(id, Arc::clone(&pool.queue))?;
            pool.workers.push(worker);
        }

        debug!(
            workers = count,
            capacity = ?config.queue_capacity,
            "Task pool started"
        );
        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs waiting for a worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue `job` and return a handle to its result
    ///
    /// A panic in `job` is caught here at the job boundary; the handle then
    /// resolves to [`JobError::Panicked`] and the worker keeps running.
    pub fn submit<F, T>(&self, job: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = bounded(1);

        let task: Task = Box::new(move || {
            let (result, outcome) = match panic::catch_unwind(AssertUnwindSafe(job)) {
                Ok(value) => (Ok(value), TaskOutcome::Completed),
                Err(payload) => (
                    Err(JobError::Panicked {
                        job: id,
                        message: panic_message(payload.as_ref()),
                    }),
                    TaskOutcome::Panicked,
                ),
            };
            // The submitter may have dropped its handle
            let _ = tx.send(result);
            outcome
        });

        self.queue.push(task);
        JobHandle::new(id, rx)
    }

    /// Block until every handle has resolved
    pub fn await_all<T, I>(&self, handles: I) -> Vec<Result<T, JobError>>
    where
        I: IntoIterator<Item = JobHandle<T>>,
    {
        await_all(handles)
    }

    /// Stop accepting work, drain the queue, and join every worker
    pub fn shutdown(mut self) -> Result<PoolSummary, WorkerError> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<PoolSummary, WorkerError> {
        self.queue.close();

        let workers = std::mem::take(&mut self.workers);
        let stats: Vec<Arc<WorkerStats>> = workers.iter().map(Worker::shared_stats).collect();

        let mut first_error = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let (jobs_completed, jobs_panicked) = worker::aggregate_stats(&stats);
        debug!(
            completed = jobs_completed,
            panicked = jobs_panicked,
            "Task pool stopped"
        );

        Ok(PoolSummary {
            workers: stats.len(),
            jobs_completed,
            jobs_panicked,
        })
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            let _ = self.stop_and_join();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_submit_and_wait() {
        let pool = TaskPool::new(PoolConfig::with_workers(2)).unwrap();
        let handle = pool.submit(|| 6 * 7);
        assert_eq!(handle.wait(), Ok(42));

        let summary = pool.shutdown().unwrap();
        assert_eq!(summary.workers, 2);
        assert_eq!(summary.jobs_completed, 1);
    }

    #[test]
    fn test_many_jobs_all_complete() {
        for workers in [1, 2, 4, 8] {
            let pool = TaskPool::new(PoolConfig::with_workers(workers)).unwrap();
            let seen = Arc::new(Mutex::new(Vec::new()));

            let handles: Vec<_> = (0..64)
                .map(|i| {
                    let seen = Arc::clone(&seen);
                    pool.submit(move || {
                        thread::sleep(Duration::from_micros(fastrand::u64(0..500)));
                        seen.lock().push(i);
                        i
                    })
                })
                .collect();

            let results = pool.await_all(handles);
            assert_eq!(results.len(), 64);
            for (i, result) in results.into_iter().enumerate() {
                assert_eq!(result, Ok(i));
            }

            let mut seen = seen.lock().clone();
            seen.sort_unstable();
            assert_eq!(seen, (0..64).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_delayed_merges_leave_one_entry_per_job() {
        use crate::index::SharedIndex;

        let jobs = 48;
        for workers in [1, 2, 8] {
            let pool = TaskPool::new(PoolConfig::with_workers(workers)).unwrap();
            let index = Arc::new(SharedIndex::new());

            let handles: Vec<_> = (0..jobs)
                .map(|i| {
                    let index = Arc::clone(&index);
                    pool.submit(move || {
                        thread::sleep(Duration::from_micros(fastrand::u64(0..800)));
                        index.merge(format!("img{}", i), format!("n: {}\n", i));
                    })
                })
                .collect();

            assert!(pool.await_all(handles).iter().all(Result::is_ok));
            assert_eq!(index.len(), jobs, "workers = {}", workers);
            pool.shutdown().unwrap();

            let index = Arc::try_unwrap(index).ok().unwrap().into_index();
            for i in 0..jobs {
                assert_eq!(index[&format!("img{}", i)], format!("n: {}\n", i));
            }
        }
    }

    #[test]
    fn test_concurrency_bounded_by_worker_count() {
        let pool = TaskPool::new(PoolConfig::with_workers(3)).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..24)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                pool.submit(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        pool.await_all(handles);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = TaskPool::new(PoolConfig::with_workers(1)).unwrap();

        let bad = pool.submit(|| -> u32 { panic!("corrupt input") });
        let good = pool.submit(|| 5u32);

        match bad.wait() {
            Err(JobError::Panicked { message, .. }) => assert_eq!(message, "corrupt input"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(good.wait(), Ok(5));

        let summary = pool.shutdown().unwrap();
        assert_eq!(summary.jobs_panicked, 1);
        assert_eq!(summary.jobs_completed, 1);
    }

    #[test]
    fn test_shutdown_runs_queued_jobs() {
        let pool = TaskPool::new(PoolConfig::with_workers(1)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            // Handles dropped on purpose: shutdown alone must drain the queue
            let _ = pool.submit(move || {
                thread::sleep(Duration::from_micros(200));
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        let summary = pool.shutdown().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert_eq!(summary.jobs_completed, 20);
    }

    #[test]
    fn test_drop_joins_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = TaskPool::new(PoolConfig::with_workers(2)).unwrap();
            for _ in 0..10 {
                let counter = Arc::clone(&counter);
                let _ = pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_bounded_queue_pool() {
        let pool = TaskPool::new(PoolConfig {
            workers: 2,
            queue_capacity: Some(2),
        })
        .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                pool.submit(move || {
                    thread::sleep(Duration::from_micros(300));
                    i * 2
                })
            })
            .collect();

        let total: usize = pool
            .await_all(handles)
            .into_iter()
            .map(|r| r.unwrap())
            .sum();
        assert_eq!(total, (0..16).map(|i| i * 2).sum::<usize>());
        assert!(pool.queued() <= 2);
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        let pool = TaskPool::new(PoolConfig::with_workers(0)).unwrap();
        assert_eq!(pool.worker_count(), 1);
        assert_eq!(pool.submit(|| "ok").wait(), Ok("ok"));
    }
}
