//! Shared job queue
//!
//! A single FIFO protected by one mutex, with two condition variables:
//! - `available`: signalled when a task is pushed or the queue is closed.
//!   Workers wait on it for "stop requested OR queue non-empty".
//! - `space`: signalled when a task is popped, for bounded queues.
//!
//! Workers only leave the idle state while holding the queue lock, so a
//! push can never slip between the emptiness check and the wait.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// What happened when a worker ran a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Panicked,
}

/// Type-erased unit of work
pub type Task = Box<dyn FnOnce() -> TaskOutcome + Send + 'static>;

struct QueueState {
    tasks: VecDeque<Task>,
    stop: bool,
}

/// Statistics for the job queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks enqueued
    pub enqueued: AtomicU64,

    /// Total tasks dequeued
    pub dequeued: AtomicU64,

    /// Number of times a submitter waited for space
    pub backpressure_events: AtomicU64,
}

impl QueueStats {
    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }
}

/// FIFO of pending tasks shared by all workers
pub struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    space: Condvar,

    /// Maximum queued tasks (`None` = unbounded)
    capacity: Option<usize>,

    /// Workers currently running a task
    active_workers: AtomicUsize,

    stats: QueueStats,
}

impl JobQueue {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                stop: false,
            }),
            available: Condvar::new(),
            space: Condvar::new(),
            capacity,
            active_workers: AtomicUsize::new(0),
            stats: QueueStats::default(),
        }
    }

    /// Enqueue a task, waiting for space if the queue is bounded and full
    pub fn push(&self, task: Task) {
        let mut state = self.state.lock();

        if let Some(cap) = self.capacity {
            if state.tasks.len() >= cap && !state.stop {
                self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                while state.tasks.len() >= cap && !state.stop {
                    self.space.wait(&mut state);
                }
            }
        }

        state.tasks.push_back(task);
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        drop(state);

        self.available.notify_one();
    }

    /// Take the next task, blocking while the queue is empty
    ///
    /// Returns `None` only once the queue is closed and fully drained.
    pub fn pop(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                drop(state);
                if self.capacity.is_some() {
                    self.space.notify_one();
                }
                return Some(task);
            }
            if state.stop {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Request stop; idle workers wake and exit once the queue is empty
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.stop = true;
        drop(state);

        self.available.notify_all();
        self.space.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().stop
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Work is complete when nothing is queued and no worker is busy
    pub fn is_complete(&self) -> bool {
        self.is_empty() && self.active_workers() == 0
    }
}

/// RAII guard for marking a worker as running a task
pub struct WorkGuard<'a> {
    queue: &'a JobQueue,
}

impl<'a> WorkGuard<'a> {
    pub fn new(queue: &'a JobQueue) -> Self {
        queue.active_workers.fetch_add(1, Ordering::SeqCst);
        Self { queue }
    }
}

impl<'a> Drop for WorkGuard<'a> {
    fn drop(&mut self) {
        self.queue.active_workers.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn noop() -> Task {
        Box::new(|| TaskOutcome::Completed)
    }

    #[test]
    fn test_queue_fifo() {
        let queue = JobQueue::new(None);
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            queue.push(Box::new(move || {
                order.lock().push(i);
                TaskOutcome::Completed
            }));
        }
        assert_eq!(queue.len(), 3);

        for _ in 0..3 {
            let task = queue.pop().unwrap();
            task();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_closed_queue_drains_before_stopping() {
        let queue = JobQueue::new(None);
        queue.push(noop());
        queue.push(noop());
        queue.close();

        assert!(queue.is_closed());
        assert!(queue.pop().is_some());
        assert!(queue.pop().is_some());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_pop_wakes_on_push() {
        let queue = Arc::new(JobQueue::new(None));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop().map(|task| task()))
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(noop());
        assert_eq!(consumer.join().unwrap(), Some(TaskOutcome::Completed));
    }

    #[test]
    fn test_pop_wakes_on_close() {
        let queue = Arc::new(JobQueue::new(None));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop().is_none())
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert!(consumer.join().unwrap());
    }

    #[test]
    fn test_bounded_queue_backpressure() {
        let queue = Arc::new(JobQueue::new(Some(1)));
        queue.push(noop());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(noop()))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.len(), 1);
        assert!(queue.pop().is_some());

        producer.join().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.stats().backpressure_count(), 1);
        assert_eq!(queue.stats().enqueued.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_queue_completion() {
        let queue = JobQueue::new(None);
        assert!(queue.is_complete());

        queue.push(noop());
        assert!(!queue.is_complete());

        let task = queue.pop().unwrap();
        let guard = WorkGuard::new(&queue);
        assert!(!queue.is_complete());

        task();
        drop(guard);
        assert!(queue.is_complete());
    }
}
