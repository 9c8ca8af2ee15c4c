//! Single background worker for thumbnail generation
//!
//! A worker owns one OS thread that executes jobs strictly one at a time in
//! submission order. Thumbnailing is disk and CPU heavy, so there is never
//! more than one worker per scheduler. When the scheduler is reset the old
//! worker is cancelled and a replacement is spawned; the replacement joins
//! its predecessor's thread before running anything, so two workers never
//! execute jobs concurrently and the render thread never blocks on the join.

use crate::cancel::CancellationToken;
use crate::job::{Completion, JobOutcome, QueuedJob};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

pub(crate) struct Worker<K, T, E> {
    generation: u64,
    jobs: Option<Sender<QueuedJob<K, T, E>>>,
    token: CancellationToken,
    running: Arc<Mutex<Option<K>>>,
    thread: Option<JoinHandle<()>>,
}

impl<K, T, E> Worker<K, T, E>
where
    K: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create and start a worker thread.
    ///
    /// The predecessor handle is taken only once the thread is running; if
    /// spawning fails it is left in `predecessor` for the next attempt.
    ///
    /// # Arguments
    ///
    /// * `generation` - Scheduler generation stamped on every completion
    /// * `completions` - Channel drained by the render thread
    /// * `predecessor` - Thread of the worker this one replaces, joined first
    pub(crate) fn spawn(
        generation: u64,
        completions: Sender<Completion<K, T, E>>,
        predecessor: &mut Option<JoinHandle<()>>,
    ) -> io::Result<Self> {
        let (jobs_tx, jobs_rx) = mpsc::channel();
        let token = CancellationToken::new();
        let running = Arc::new(Mutex::new(None));
        let handoff = Arc::new(Mutex::new(predecessor.take()));

        let spawned = {
            let token = token.clone();
            let running = running.clone();
            let handoff = handoff.clone();
            thread::Builder::new()
                .name(format!("thumbnail-worker-{}", generation))
                .spawn(move || {
                    let previous = handoff.lock().unwrap_or_else(PoisonError::into_inner).take();
                    if let Some(previous) = previous {
                        if previous.join().is_err() {
                            log::error!("previous thumbnail worker panicked");
                        }
                    }
                    Self::run(generation, jobs_rx, completions, token, running);
                })
        };

        let thread = match spawned {
            Ok(thread) => thread,
            Err(err) => {
                *predecessor = handoff.lock().unwrap_or_else(PoisonError::into_inner).take();
                return Err(err);
            }
        };

        Ok(Self {
            generation,
            jobs: Some(jobs_tx),
            token,
            running,
            thread: Some(thread),
        })
    }

    /// Main worker loop.
    ///
    /// Pulls jobs until the queue is closed or the worker is cancelled.
    /// Results produced after cancellation are dropped here rather than
    /// handed to the render thread.
    fn run(
        generation: u64,
        jobs: Receiver<QueuedJob<K, T, E>>,
        completions: Sender<Completion<K, T, E>>,
        token: CancellationToken,
        running: Arc<Mutex<Option<K>>>,
    ) {
        log::debug!("thumbnail worker {} started", generation);

        while let Ok(QueuedJob { key, body }) = jobs.recv() {
            if token.is_cancelled() {
                break;
            }

            set_running(&running, Some(key.clone()));
            let job_token = &token;
            let outcome = match panic::catch_unwind(AssertUnwindSafe(move || body(job_token))) {
                Ok(Ok(value)) => JobOutcome::Completed(value),
                Ok(Err(error)) => JobOutcome::Failed(error),
                Err(payload) => JobOutcome::Panicked(panic_message(payload.as_ref())),
            };
            set_running(&running, None);

            if token.is_cancelled() {
                log::debug!("thumbnail worker {} dropping result after cancel", generation);
                break;
            }

            let completion = Completion {
                generation,
                key,
                outcome,
            };
            if completions.send(completion).is_err() {
                break;
            }
        }

        log::debug!("thumbnail worker {} stopped", generation);
    }

    /// Queue a job. Returns `false` if the worker thread is gone.
    pub(crate) fn submit(&self, job: QueuedJob<K, T, E>) -> bool {
        match &self.jobs {
            Some(jobs) => jobs.send(job).is_ok(),
            None => false,
        }
    }

    /// Key of the job currently executing, if any
    pub(crate) fn running(&self) -> Option<K> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cancel the worker and close its queue without waiting.
    ///
    /// Returns the thread handle so a successor can join it.
    pub(crate) fn stop(mut self) -> Option<JoinHandle<()>> {
        log::debug!("stopping thumbnail worker {}", self.generation);
        self.token.cancel();
        self.jobs = None;
        self.thread.take()
    }
}

impl<K, T, E> Drop for Worker<K, T, E> {
    fn drop(&mut self) {
        // Detach: the thread exits after its current job
        self.token.cancel();
        self.jobs = None;
    }
}

fn set_running<K>(running: &Mutex<Option<K>>, key: Option<K>) {
    *running.lock().unwrap_or_else(PoisonError::into_inner) = key;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "job panicked".to_string()
    }
}
