//! Single-flight FIFO job sequencer with abort-all semantics.
//!
//! At most one job is active at a time. A job that fails clears every
//! pending job, so one failure anywhere stops the rest of the run while
//! leaving side effects of earlier jobs in place.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DeviceChannel, DeviceMessage, Job, JobFuture, JobResult, SyncError};

/// Observable sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// No active job; ready for a new cycle of enqueues.
    Idle,
    /// A drain is in progress.
    Draining,
}

/// How a call to [`JobSequencer::start`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The queue was empty; nothing ran.
    Idle,
    /// Another drain is already running; this call did nothing.
    Busy,
    /// Every job proceeded and the queue is exhausted.
    Completed {
        /// Jobs run during this drain.
        jobs_run: usize,
    },
    /// A job aborted; pending jobs were discarded.
    Aborted {
        /// Error the failing job returned.
        error: SyncError,
        /// Pending jobs dropped by the abort.
        discarded: usize,
    },
    /// [`JobSequencer::cancel_all`] was called while a job was in flight.
    Cancelled {
        /// Jobs run during this drain, including the cancelled one.
        jobs_run: usize,
    },
}

/// Callback invoked once whenever a job aborts the queue.
#[async_trait]
pub trait AbortHook: Send + Sync {
    /// Called after the queue has been cleared.
    async fn on_abort(&self, error: &SyncError);
}

struct QueueState {
    pending: VecDeque<Job>,
    active: Option<String>,
    /// Bumped on every cancel/abort so late completions can be discarded.
    generation: u64,
}

impl QueueState {
    fn clear(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        self.active = None;
        self.generation = self.generation.wrapping_add(1);
        discarded
    }

    fn activate_next(&mut self) -> Option<(String, JobFuture)> {
        if let Some(job) = self.pending.pop_front() {
            let (label, future) = job.into_parts();
            self.active = Some(label.clone());
            Some((label, future))
        } else {
            self.active = None;
            None
        }
    }
}

enum Settled {
    Next(String, JobFuture),
    Exhausted,
    Stale,
    Aborted(SyncError, usize),
}

/// Cloneable handle to a shared job queue.
///
/// A handle from [`JobSequencer::pinned`] belongs to one cycle: once that
/// cycle is cancelled or aborted, its enqueues are dropped.
#[derive(Clone)]
pub struct JobSequencer {
    state: Arc<Mutex<QueueState>>,
    abort_hook: Option<Arc<dyn AbortHook>>,
    job_timeout: Option<Duration>,
    cycle: Option<u64>,
}

impl Default for JobSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl JobSequencer {
    /// Create an idle sequencer.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                pending: VecDeque::new(),
                active: None,
                generation: 0,
            })),
            abort_hook: None,
            job_timeout: None,
            cycle: None,
        }
    }

    /// Attach a hook notified on every abort.
    #[must_use]
    pub fn with_abort_hook(mut self, hook: Arc<dyn AbortHook>) -> Self {
        self.abort_hook = Some(hook);
        self
    }

    /// Treat a job running longer than `timeout` as an abort.
    #[must_use]
    pub const fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    /// Handle tied to the current cycle.
    ///
    /// Jobs enqueued through it after a [`cancel_all`](Self::cancel_all) or
    /// an abort are dropped instead of leaking into the next cycle.
    #[must_use]
    pub fn pinned(&self) -> Self {
        let generation = self.state.lock().generation;
        Self {
            cycle: Some(generation),
            ..self.clone()
        }
    }

    /// Whether this handle's cycle is still live. Always true for an
    /// unpinned handle.
    pub fn is_current(&self) -> bool {
        !self.is_stale(&self.state.lock())
    }

    fn is_stale(&self, state: &QueueState) -> bool {
        self.cycle.is_some_and(|cycle| cycle != state.generation)
    }

    /// Append a job. Never runs it.
    pub fn enqueue(&self, job: Job) {
        let mut state = self.state.lock();
        if self.is_stale(&state) {
            tracing::debug!(job = job.label(), "cycle ended; job dropped");
            return;
        }
        tracing::trace!(job = job.label(), "enqueue");
        state.pending.push_back(job);
    }

    /// Append a batch of jobs, preserving their order.
    pub fn enqueue_all(&self, jobs: impl IntoIterator<Item = Job>) {
        let mut state = self.state.lock();
        if self.is_stale(&state) {
            let dropped = jobs.into_iter().count();
            tracing::debug!(dropped, "cycle ended; jobs dropped");
            return;
        }
        state.pending.extend(jobs);
    }

    /// Enqueue a job sending `message`; a nack aborts the queue.
    pub fn enqueue_message(
        &self,
        channel: Arc<dyn DeviceChannel>,
        message: DeviceMessage,
        log_text: impl Into<String>,
    ) {
        let log_text = log_text.into();
        let label = format!("send {}", message.keys_summary());
        self.enqueue(Job::new(label, async move {
            if !log_text.is_empty() {
                tracing::info!("{log_text}");
            }
            channel.send(&message).await.inspect_err(|e| {
                tracing::error!(
                    keys = %message.keys_summary(),
                    "error sending message to device: {e}"
                );
            })
        }));
    }

    /// Drop every pending job and clear the active slot.
    ///
    /// A job already in flight keeps running, but its completion is ignored.
    pub fn cancel_all(&self) {
        let discarded = self.state.lock().clear();
        tracing::debug!(discarded, "cancelled all jobs");
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Label of the active job, if any.
    pub fn active_job(&self) -> Option<String> {
        self.state.lock().active.clone()
    }

    /// Current state.
    pub fn state(&self) -> SequencerState {
        if self.state.lock().active.is_some() {
            SequencerState::Draining
        } else {
            SequencerState::Idle
        }
    }

    /// Whether a drain is in progress.
    pub fn is_draining(&self) -> bool {
        self.state() == SequencerState::Draining
    }

    /// Drain the queue one job at a time.
    ///
    /// Returns immediately with [`DrainOutcome::Busy`] when another drain is
    /// active and with [`DrainOutcome::Idle`] when there is nothing to run.
    /// Jobs enqueued while draining (including by the running job) are picked
    /// up by this drain.
    pub async fn start(&self) -> DrainOutcome {
        let (generation, first) = {
            let mut state = self.state.lock();
            if state.active.is_some() {
                return DrainOutcome::Busy;
            }
            match state.activate_next() {
                Some(next) => (state.generation, next),
                None => return DrainOutcome::Idle,
            }
        };

        let (mut label, mut future) = first;
        let mut jobs_run = 0usize;
        loop {
            tracing::debug!(job = %label, "job started");
            let result = self.run_job(&label, future).await;
            jobs_run += 1;

            match self.settle(generation, &label, result) {
                Settled::Next(next_label, next_future) => {
                    label = next_label;
                    future = next_future;
                }
                Settled::Exhausted => {
                    tracing::debug!(jobs_run, "job queue drained");
                    return DrainOutcome::Completed { jobs_run };
                }
                Settled::Stale => {
                    tracing::debug!(job = %label, "job completed after cancellation; ignored");
                    return DrainOutcome::Cancelled { jobs_run };
                }
                Settled::Aborted(error, discarded) => {
                    tracing::warn!(job = %label, discarded, "job aborted: {error}");
                    if let Some(hook) = &self.abort_hook {
                        hook.on_abort(&error).await;
                    }
                    return DrainOutcome::Aborted { error, discarded };
                }
            }
        }
    }

    async fn run_job(&self, label: &str, future: JobFuture) -> JobResult {
        match self.job_timeout {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .unwrap_or_else(|_| Err(SyncError::Timeout(label.to_string()))),
            None => future.await,
        }
    }

    fn settle(&self, generation: u64, label: &str, result: JobResult) -> Settled {
        let mut state = self.state.lock();
        if state.generation != generation {
            return Settled::Stale;
        }
        match result {
            Ok(()) => {
                tracing::trace!(job = %label, "job proceeded");
                state
                    .activate_next()
                    .map_or(Settled::Exhausted, |(l, f)| Settled::Next(l, f))
            }
            Err(error) => {
                let discarded = state.clear();
                Settled::Aborted(error, discarded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recording_job(label: &str, log: &Arc<Mutex<Vec<String>>>, result: JobResult) -> Job {
        let log = Arc::clone(log);
        let name = label.to_string();
        Job::new(label, async move {
            log.lock().push(name);
            result
        })
    }

    #[tokio::test]
    async fn test_runs_jobs_in_fifo_order() {
        let seq = JobSequencer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            seq.enqueue(recording_job(name, &log, Ok(())));
        }

        assert_eq!(seq.start().await, DrainOutcome::Completed { jobs_run: 3 });
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[tokio::test]
    async fn test_enqueue_does_not_run() {
        let seq = JobSequencer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        seq.enqueue(recording_job("a", &log, Ok(())));
        tokio::task::yield_now().await;
        assert!(log.lock().is_empty());
        assert_eq!(seq.pending(), 1);
    }

    #[tokio::test]
    async fn test_abort_discards_pending() {
        let seq = JobSequencer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        seq.enqueue(recording_job("a", &log, Ok(())));
        seq.enqueue(recording_job("b", &log, Err(SyncError::Provider("boom".into()))));
        seq.enqueue(recording_job("c", &log, Ok(())));
        seq.enqueue(recording_job("d", &log, Ok(())));

        let outcome = seq.start().await;
        assert_eq!(
            outcome,
            DrainOutcome::Aborted {
                error: SyncError::Provider("boom".into()),
                discarded: 2
            }
        );
        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert_eq!(seq.pending(), 0);
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[tokio::test]
    async fn test_start_on_empty_queue_is_noop() {
        let seq = JobSequencer::new();
        assert_eq!(seq.start().await, DrainOutcome::Idle);
    }

    #[tokio::test]
    async fn test_job_can_enqueue_follow_up_jobs() {
        let seq = JobSequencer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = seq.clone();
        let inner_log = Arc::clone(&log);
        seq.enqueue(Job::new("plan", async move {
            inner.enqueue(recording_job("follow-up", &inner_log, Ok(())));
            Ok(())
        }));
        seq.enqueue(recording_job("tail", &log, Ok(())));

        assert_eq!(seq.start().await, DrainOutcome::Completed { jobs_run: 3 });
        assert_eq!(*log.lock(), vec!["tail", "follow-up"]);
    }

    #[tokio::test]
    async fn test_completion_after_cancel_is_ignored() {
        let seq = JobSequencer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = seq.clone();
        seq.enqueue(Job::new("cancels", async move {
            inner.cancel_all();
            Ok(())
        }));
        seq.enqueue(recording_job("never", &log, Ok(())));

        assert_eq!(seq.start().await, DrainOutcome::Cancelled { jobs_run: 1 });
        assert!(log.lock().is_empty());
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[tokio::test]
    async fn test_pinned_enqueue_after_cancel_is_dropped() {
        let seq = JobSequencer::new();
        let cycle = seq.pinned();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = cycle.clone();
        let inner_log = Arc::clone(&log);
        cycle.enqueue(Job::new("plan", async move {
            inner.cancel_all();
            inner.enqueue(recording_job("leaked", &inner_log, Ok(())));
            Ok(())
        }));

        assert_eq!(seq.start().await, DrainOutcome::Cancelled { jobs_run: 1 });
        assert!(!cycle.is_current());
        assert_eq!(seq.pending(), 0);

        seq.enqueue(recording_job("next run", &log, Ok(())));
        assert_eq!(seq.start().await, DrainOutcome::Completed { jobs_run: 1 });
        assert_eq!(*log.lock(), vec!["next run"]);
    }

    #[test]
    fn test_pinned_handle_tracks_aborts() {
        let seq = JobSequencer::new();
        let cycle = seq.pinned();
        assert!(cycle.is_current());
        assert!(seq.is_current());

        seq.cancel_all();
        assert!(!cycle.is_current());
        cycle.enqueue_all([Job::noop("a"), Job::noop("b")]);
        assert_eq!(seq.pending(), 0);
        assert!(seq.pinned().is_current());
    }

    #[tokio::test]
    async fn test_second_start_while_draining_is_busy() {
        let seq = JobSequencer::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        seq.enqueue(Job::new("wait", async move {
            let _ = rx.await;
            Ok(())
        }));

        let drain = tokio::spawn({
            let seq = seq.clone();
            async move { seq.start().await }
        });
        while !seq.is_draining() {
            tokio::task::yield_now().await;
        }
        assert_eq!(seq.start().await, DrainOutcome::Busy);
        let _ = tx.send(());
        assert_eq!(drain.await.unwrap(), DrainOutcome::Completed { jobs_run: 1 });
    }

    struct CountingHook(AtomicUsize);

    #[async_trait]
    impl AbortHook for CountingHook {
        async fn on_abort(&self, _error: &SyncError) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_abort_hook_fires_once() {
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        let seq = JobSequencer::new().with_abort_hook(hook.clone());
        seq.enqueue(Job::new("fail", async { Err(SyncError::ExternalService("x".into())) }));
        seq.enqueue(Job::noop("after"));

        assert!(matches!(seq.start().await, DrainOutcome::Aborted { .. }));
        assert_eq!(hook.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_abort() {
        let seq = JobSequencer::new().with_job_timeout(Duration::from_millis(10));
        seq.enqueue(Job::new("slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }));
        seq.enqueue(Job::noop("after"));

        assert_eq!(
            seq.start().await,
            DrainOutcome::Aborted {
                error: SyncError::Timeout("slow".into()),
                discarded: 1
            }
        );
    }
}
