//! Generation scheduler
//!
//! Owns exactly one worker at a time, deduplicates outstanding jobs by key
//! and hands finished jobs back to the render thread through a channel that
//! is drained once per frame.

use crate::cancel::CancellationToken;
use crate::job::{Completion, JobBody, JobOutcome, JobState, QueuedJob};
use crate::worker::Worker;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Total jobs accepted by `schedule`
    pub jobs_submitted: u64,

    /// Jobs whose value was handed to the render thread
    pub jobs_completed: u64,

    /// Jobs that returned an error or panicked
    pub jobs_failed: u64,

    /// Jobs abandoned by a reset or shutdown
    pub jobs_cancelled: u64,

    /// Requests ignored because an identical job was outstanding
    pub duplicates_ignored: u64,

    /// Results that arrived from a replaced worker and were dropped
    pub stale_discarded: u64,

    /// Number of resets
    pub resets: u64,
}

impl SchedulerStats {
    /// Get the number of jobs currently outstanding
    pub fn pending_jobs(&self) -> u64 {
        self.jobs_submitted
            .saturating_sub(self.jobs_completed)
            .saturating_sub(self.jobs_failed)
            .saturating_sub(self.jobs_cancelled)
    }
}

/// Errors raised while managing the worker
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("failed to spawn thumbnail worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Single-worker job scheduler with render-thread completion handoff
///
/// `K` identifies a job (at most one outstanding job per key), `T` is the
/// value produced on the worker and `E` its error type. All methods are
/// called from the render thread; only job bodies run on the worker.
///
/// # Example
///
/// ```
/// use filechooser_scheduler::{GenerationScheduler, JobOutcome};
/// use std::time::Duration;
///
/// let mut scheduler: GenerationScheduler<&str, u32, String> =
///     GenerationScheduler::new().unwrap();
///
/// assert!(scheduler.schedule("photo.jpg", |_token| Ok(256)));
/// // Same key while outstanding: ignored
/// assert!(!scheduler.schedule("photo.jpg", |_token| Ok(256)));
///
/// let completions = scheduler.wait(Duration::from_secs(5));
/// assert!(matches!(completions[0].outcome, JobOutcome::Completed(256)));
/// ```
pub struct GenerationScheduler<K, T, E> {
    worker: Option<Worker<K, T, E>>,
    /// Thread of the last stopped worker while no successor is running
    predecessor: Option<JoinHandle<()>>,
    /// A respawn failure has been logged since the last running worker
    spawn_failure_logged: bool,
    generation: u64,
    pending: HashSet<K>,
    completions_tx: Sender<Completion<K, T, E>>,
    completions_rx: Receiver<Completion<K, T, E>>,
    stats: SchedulerStats,
    shut_down: bool,
}

impl<K, T, E> GenerationScheduler<K, T, E>
where
    K: Clone + Eq + Hash + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a scheduler and start its worker
    pub fn new() -> Result<Self, SchedulerError> {
        let (completions_tx, completions_rx) = mpsc::channel();
        let worker = Worker::spawn(0, completions_tx.clone(), &mut None)?;

        Ok(Self {
            worker: Some(worker),
            predecessor: None,
            spawn_failure_logged: false,
            generation: 0,
            pending: HashSet::new(),
            completions_tx,
            completions_rx,
            stats: SchedulerStats::default(),
            shut_down: false,
        })
    }

    /// Queue a job for `key`
    ///
    /// Returns `false` without queuing if a job for `key` is already
    /// outstanding, if the scheduler has been shut down, or if no worker is
    /// available. A worker that failed to start during `reset` is spawned
    /// again here.
    pub fn schedule<F>(&mut self, key: K, body: F) -> bool
    where
        F: FnOnce(&CancellationToken) -> Result<T, E> + Send + 'static,
    {
        if self.shut_down {
            return false;
        }

        if self.pending.contains(&key) {
            self.stats.duplicates_ignored += 1;
            return false;
        }

        if !self.ensure_worker() {
            return false;
        }
        let Some(worker) = &self.worker else {
            return false;
        };

        let body: JobBody<T, E> = Box::new(body);
        if !worker.submit(QueuedJob {
            key: key.clone(),
            body,
        }) {
            log::warn!("thumbnail worker queue closed, dropping job");
            return false;
        }

        self.pending.insert(key);
        self.stats.jobs_submitted += 1;
        true
    }

    /// Check whether a job for `key` is queued or running
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains(key)
    }

    /// State of the outstanding job for `key`, if there is one
    pub fn state(&self, key: &K) -> Option<JobState> {
        if !self.pending.contains(key) {
            return None;
        }

        let running = self.worker.as_ref().and_then(|worker| worker.running());
        if running.as_ref() == Some(key) {
            Some(JobState::Running)
        } else {
            Some(JobState::Queued)
        }
    }

    /// Number of outstanding jobs
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Cancel all queued and running work and start a fresh worker
    ///
    /// Results of abandoned jobs are never delivered. The replacement worker
    /// waits for the old thread to exit before running new jobs.
    pub fn reset(&mut self) -> Result<(), SchedulerError> {
        self.stats.resets += 1;
        self.abandon_pending();

        if let Some(worker) = self.worker.take() {
            self.predecessor = worker.stop();
        }
        self.generation += 1;
        self.discard_stale();

        if self.shut_down {
            return Ok(());
        }

        self.worker = Some(Worker::spawn(
            self.generation,
            self.completions_tx.clone(),
            &mut self.predecessor,
        )?);
        self.spawn_failure_logged = false;
        Ok(())
    }

    /// Take every finished job of the current generation without blocking
    ///
    /// Call once per frame on the render thread.
    pub fn drain(&mut self) -> Vec<Completion<K, T, E>> {
        let mut accepted = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.accept(&completion) {
                accepted.push(completion);
            }
        }
        accepted
    }

    /// Block for up to `timeout` until at least one job finishes
    ///
    /// Returns immediately when nothing is outstanding. Meant for headless
    /// hosts without a frame loop.
    pub fn wait(&mut self, timeout: Duration) -> Vec<Completion<K, T, E>> {
        let mut accepted = self.drain();
        if !accepted.is_empty() || self.pending.is_empty() {
            return accepted;
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completions_rx.recv_timeout(remaining) {
                Ok(completion) => {
                    if self.accept(&completion) {
                        accepted.push(completion);
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        accepted.extend(self.drain());
        accepted
    }

    /// Stop the worker and refuse further jobs
    ///
    /// Does not wait for a running job; its result is dropped.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.abandon_pending();
        if let Some(worker) = self.worker.take() {
            // Detached; the thread exits after its current job
            drop(worker.stop());
        }
        self.predecessor = None;
        self.generation += 1;
        self.discard_stale();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Current worker generation, bumped by every reset
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Start a worker if the last spawn failed; `false` if none is running
    fn ensure_worker(&mut self) -> bool {
        if self.worker.is_some() {
            return true;
        }

        match Worker::spawn(
            self.generation,
            self.completions_tx.clone(),
            &mut self.predecessor,
        ) {
            Ok(worker) => {
                log::debug!("thumbnail worker {} started after earlier failure", self.generation);
                self.worker = Some(worker);
                self.spawn_failure_logged = false;
                true
            }
            Err(err) => {
                if !self.spawn_failure_logged {
                    log::warn!("no thumbnail worker available, dropping jobs: {}", err);
                    self.spawn_failure_logged = true;
                }
                false
            }
        }
    }

    fn abandon_pending(&mut self) {
        self.stats.jobs_cancelled += self.pending.len() as u64;
        self.pending.clear();
    }

    fn discard_stale(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.accept(&completion);
        }
    }

    /// Book-keeping for a received completion; `false` if it is stale
    fn accept(&mut self, completion: &Completion<K, T, E>) -> bool {
        if completion.generation != self.generation
            || !self.pending.remove(&completion.key)
        {
            self.stats.stale_discarded += 1;
            return false;
        }

        match completion.outcome {
            JobOutcome::Completed(_) => self.stats.jobs_completed += 1,
            JobOutcome::Failed(_) | JobOutcome::Panicked(_) => self.stats.jobs_failed += 1,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    type TestScheduler = GenerationScheduler<String, u32, String>;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn key(name: &str) -> String {
        name.to_string()
    }

    /// Collect completions until `count` have arrived or the timeout elapses
    fn collect(scheduler: &mut TestScheduler, count: usize) -> Vec<Completion<String, u32, String>> {
        let deadline = Instant::now() + TIMEOUT;
        let mut completions = Vec::new();
        while completions.len() < count && Instant::now() < deadline {
            completions.extend(scheduler.wait(Duration::from_millis(100)));
        }
        completions
    }

    #[test]
    fn test_schedule_and_complete() {
        let mut scheduler = TestScheduler::new().unwrap();

        assert!(scheduler.schedule(key("a.jpg"), |_| Ok(64)));
        assert!(scheduler.is_pending(&key("a.jpg")));

        let completions = collect(&mut scheduler, 1);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].key, "a.jpg");
        assert!(matches!(completions[0].outcome, JobOutcome::Completed(64)));

        assert!(!scheduler.is_pending(&key("a.jpg")));
        assert_eq!(scheduler.stats().jobs_completed, 1);
        assert_eq!(scheduler.stats().pending_jobs(), 0);
    }

    #[test]
    fn test_duplicate_pending_job_runs_once() {
        let mut scheduler = TestScheduler::new().unwrap();
        let executions = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let counter = executions.clone();
        assert!(scheduler.schedule(key("a.jpg"), move |_| {
            release_rx.recv_timeout(TIMEOUT).ok();
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }));

        let counter = executions.clone();
        assert!(!scheduler.schedule(key("a.jpg"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        }));

        release_tx.send(()).unwrap();
        let completions = collect(&mut scheduler, 1);
        thread::sleep(Duration::from_millis(50));

        assert_eq!(completions.len(), 1);
        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.stats().duplicates_ignored, 1);
    }

    #[test]
    fn test_key_can_be_rescheduled_after_completion() {
        let mut scheduler = TestScheduler::new().unwrap();

        assert!(scheduler.schedule(key("a.jpg"), |_| Ok(1)));
        assert_eq!(collect(&mut scheduler, 1).len(), 1);

        assert!(scheduler.schedule(key("a.jpg"), |_| Ok(2)));
        assert_eq!(collect(&mut scheduler, 1).len(), 1);
    }

    #[test]
    fn test_jobs_run_in_submission_order() {
        let mut scheduler = TestScheduler::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..6u32 {
            let order = order.clone();
            scheduler.schedule(format!("{}.png", i), move |_| {
                order.lock().unwrap().push(i);
                thread::sleep(Duration::from_millis(2));
                Ok(i)
            });
        }

        let completions = collect(&mut scheduler, 6);
        assert_eq!(completions.len(), 6);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_single_job_in_flight() {
        let mut scheduler = TestScheduler::new().unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        for i in 0..8u32 {
            let active = active.clone();
            let max_active = max_active.clone();
            scheduler.schedule(format!("{}.png", i), move |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            });
        }

        assert_eq!(collect(&mut scheduler, 8).len(), 8);
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_discards_slow_job() {
        let mut scheduler = TestScheduler::new().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        scheduler.schedule(key("slow.jpg"), move |_| {
            started_tx.send(()).unwrap();
            release_rx.recv_timeout(TIMEOUT).ok();
            Ok(1)
        });
        scheduler.schedule(key("queued.jpg"), |_| Ok(2));
        started_rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(scheduler.state(&key("slow.jpg")), Some(JobState::Running));
        assert_eq!(scheduler.state(&key("queued.jpg")), Some(JobState::Queued));

        scheduler.reset().unwrap();
        assert_eq!(scheduler.pending_len(), 0);
        assert_eq!(scheduler.state(&key("slow.jpg")), None);

        release_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(scheduler.drain().is_empty());

        // The fresh worker still runs new jobs
        assert!(scheduler.schedule(key("slow.jpg"), |_| Ok(3)));
        let completions = collect(&mut scheduler, 1);
        assert_eq!(completions.len(), 1);
        assert!(matches!(completions[0].outcome, JobOutcome::Completed(3)));
        assert_eq!(completions[0].generation, scheduler.generation());

        let stats = scheduler.stats();
        assert_eq!(stats.resets, 1);
        assert_eq!(stats.jobs_cancelled, 2);
    }

    #[test]
    fn test_reset_drops_already_delivered_results() {
        let mut scheduler = TestScheduler::new().unwrap();

        scheduler.schedule(key("a.jpg"), |_| Ok(1));
        // Let the result reach the channel without draining it
        thread::sleep(Duration::from_millis(100));

        scheduler.reset().unwrap();
        assert!(scheduler.drain().is_empty());
        assert_eq!(scheduler.stats().jobs_completed, 0);
    }

    #[test]
    fn test_cancelled_token_visible_to_running_job() {
        let mut scheduler = TestScheduler::new().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (observed_tx, observed_rx) = mpsc::channel();

        scheduler.schedule(key("a.jpg"), move |token| {
            started_tx.send(()).unwrap();
            let deadline = Instant::now() + TIMEOUT;
            while !token.is_cancelled() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
            observed_tx.send(token.is_cancelled()).unwrap();
            Err("cancelled".to_string())
        });

        started_rx.recv_timeout(TIMEOUT).unwrap();
        scheduler.reset().unwrap();
        assert!(observed_rx.recv_timeout(TIMEOUT).unwrap());
    }

    #[test]
    fn test_failed_and_panicked_jobs() {
        let mut scheduler = TestScheduler::new().unwrap();

        scheduler.schedule(key("bad.jpg"), |_| Err("corrupt header".to_string()));
        scheduler.schedule(key("worse.jpg"), |_| panic!("decoder crashed"));
        scheduler.schedule(key("good.jpg"), |_| Ok(1));

        let completions = collect(&mut scheduler, 3);
        assert_eq!(completions.len(), 3);
        assert!(matches!(&completions[0].outcome, JobOutcome::Failed(e) if e == "corrupt header"));
        assert!(matches!(&completions[1].outcome, JobOutcome::Panicked(_)));
        assert!(matches!(completions[2].outcome, JobOutcome::Completed(1)));
        assert_eq!(completions[0].outcome.state(), JobState::Failed);

        let stats = scheduler.stats();
        assert_eq!(stats.jobs_failed, 2);
        assert_eq!(stats.jobs_completed, 1);
    }

    #[test]
    fn test_missing_worker_is_respawned_on_schedule() {
        let mut scheduler = TestScheduler::new().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        scheduler.schedule(key("old.jpg"), move |_| {
            started_tx.send(()).unwrap();
            release_rx.recv_timeout(TIMEOUT).ok();
            Ok(1)
        });
        started_rx.recv_timeout(TIMEOUT).unwrap();

        // State left behind by a reset whose spawn failed
        scheduler.reset().unwrap();
        let replacement = scheduler.worker.take().unwrap();
        scheduler.predecessor = replacement.stop();
        assert!(scheduler.worker.is_none());

        assert!(scheduler.schedule(key("new.jpg"), |_| Ok(2)));
        assert!(scheduler.worker.is_some());
        assert!(scheduler.predecessor.is_none());

        release_tx.send(()).unwrap();
        let completions = collect(&mut scheduler, 1);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].key, "new.jpg");
        assert!(matches!(completions[0].outcome, JobOutcome::Completed(2)));
    }

    #[test]
    fn test_shutdown_rejects_jobs() {
        let mut scheduler = TestScheduler::new().unwrap();
        scheduler.shutdown();

        assert!(scheduler.is_shut_down());
        assert!(!scheduler.schedule(key("a.jpg"), |_| Ok(1)));
        assert!(scheduler.reset().is_ok());
        assert!(!scheduler.schedule(key("a.jpg"), |_| Ok(1)));
        assert!(scheduler.wait(Duration::from_millis(10)).is_empty());
    }

    #[test]
    fn test_wait_returns_immediately_when_idle() {
        let mut scheduler = TestScheduler::new().unwrap();
        let start = Instant::now();
        assert!(scheduler.wait(Duration::from_secs(10)).is_empty());
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
