//! Generation job types

use crate::cancel::CancellationToken;

/// Work executed on the worker thread
///
/// The body receives the worker's cancellation token and produces either a
/// value for the render thread or an error. It must not touch render-thread
/// state.
pub type JobBody<T, E> = Box<dyn FnOnce(&CancellationToken) -> Result<T, E> + Send>;

/// Lifecycle of a generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Waiting in the worker queue
    Queued,
    /// Currently executing on the worker thread
    Running,
    /// Produced a value
    Completed,
    /// Returned an error or panicked
    Failed,
    /// Dropped by a reset or shutdown before its result was applied
    Cancelled,
}

/// Result of running a job body
#[derive(Debug)]
pub enum JobOutcome<T, E> {
    Completed(T),
    Failed(E),
    /// The job body panicked; carries the panic message
    Panicked(String),
}

impl<T, E> JobOutcome<T, E> {
    /// Terminal state corresponding to this outcome
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Completed(_) => JobState::Completed,
            JobOutcome::Failed(_) | JobOutcome::Panicked(_) => JobState::Failed,
        }
    }
}

/// A finished job handed back to the render thread
#[derive(Debug)]
pub struct Completion<K, T, E> {
    /// Worker generation that produced this result
    pub generation: u64,
    pub key: K,
    pub outcome: JobOutcome<T, E>,
}

pub(crate) struct QueuedJob<K, T, E> {
    pub key: K,
    pub body: JobBody<T, E>,
}
