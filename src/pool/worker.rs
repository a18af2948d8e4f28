//! Worker thread logic for the task pool
//!
//! Each worker:
//! - Waits on the shared queue while idle
//! - Runs one task at a time, outside the queue lock
//! - Exits only after stop was requested and the queue is empty

use crate::error::WorkerError;
use crate::pool::queue::{JobQueue, TaskOutcome, WorkGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Tasks run to completion
    pub jobs_completed: AtomicU64,

    /// Tasks whose closure panicked
    pub jobs_panicked: AtomicU64,
}

impl WorkerStats {
    fn record(&self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Completed => self.jobs_completed.fetch_add(1, Ordering::Relaxed),
            TaskOutcome::Panicked => self.jobs_panicked.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn jobs_run(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed) + self.jobs_panicked.load(Ordering::Relaxed)
    }
}

/// A worker thread that runs queued tasks
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(id: usize, queue: Arc<JobQueue>) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("sift-worker-{}", id))
            .spawn(move || worker_loop(id, queue, stats_clone))
            .map_err(|e| WorkerError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Shared handle to the stats, usable after `join`
    pub fn shared_stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                id: self.id,
                message: "Worker thread panicked".into(),
            }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(id: usize, queue: Arc<JobQueue>, stats: Arc<WorkerStats>) {
    debug!(worker = id, "Worker starting");

    while let Some(task) = queue.pop() {
        let _guard = WorkGuard::new(&queue);
        let outcome = task();
        if outcome == TaskOutcome::Panicked {
            warn!(worker = id, "Job panicked; worker continues");
        } else {
            trace!(worker = id, "Job completed");
        }
        stats.record(outcome);
    }

    debug!(
        worker = id,
        jobs = stats.jobs_run(),
        "Worker shutting down"
    );
}

/// Sum of (completed, panicked) over all workers
pub fn aggregate_stats(stats: &[Arc<WorkerStats>]) -> (u64, u64) {
    stats.iter().fold((0, 0), |(done, panicked), s| {
        (
            done + s.jobs_completed.load(Ordering::Relaxed),
            panicked + s.jobs_panicked.load(Ordering::Relaxed),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_stats() {
        let stats = WorkerStats::default();
        stats.record(TaskOutcome::Completed);
        stats.record(TaskOutcome::Completed);
        stats.record(TaskOutcome::Panicked);

        assert_eq!(stats.jobs_completed.load(Ordering::Relaxed), 2);
        assert_eq!(stats.jobs_panicked.load(Ordering::Relaxed), 1);
        assert_eq!(stats.jobs_run(), 3);
    }

    #[test]
    fn test_worker_drains_then_exits() {
        let queue = Arc::new(JobQueue::new(None));
        for _ in 0..5 {
            queue.push(Box::new(|| TaskOutcome::Completed));
        }
        queue.close();

        let worker = Worker::spawn(0, Arc::clone(&queue)).unwrap();
        let worker_id = worker.id();
        let stats = worker.shared_stats();
        worker.join().unwrap();

        assert_eq!(worker_id, 0);
        assert_eq!(stats.jobs_run(), 5);
        assert!(queue.is_complete());
    }
}
