//! Completion handles for submitted jobs

use crate::error::JobError;
use crossbeam_channel::Receiver;

/// Waitable handle for one submitted job
///
/// Backed by a single-slot channel that the job's wrapper fills exactly
/// once. If the job is dropped without running, the sender goes away and
/// `wait` reports [`JobError::Abandoned`].
#[derive(Debug)]
pub struct JobHandle<T> {
    id: u64,
    rx: Receiver<Result<T, JobError>>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(id: u64, rx: Receiver<Result<T, JobError>>) -> Self {
        Self { id, rx }
    }

    /// Sequence number assigned at submit time
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once the job has produced its result
    pub fn is_finished(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Block until the job finishes
    pub fn wait(self) -> Result<T, JobError> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(JobError::Abandoned { job: self.id }),
        }
    }
}

/// Block until every handle has resolved
///
/// Results come back in the order of `handles`; jobs themselves may have
/// finished in any order.
pub fn await_all<T, I>(handles: I) -> Vec<Result<T, JobError>>
where
    I: IntoIterator<Item = JobHandle<T>>,
{
    handles.into_iter().map(JobHandle::wait).collect()
}
