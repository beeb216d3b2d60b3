//! Deferred units of work run by the [`JobSequencer`](super::JobSequencer).

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::SyncError;

/// Completion of a job: `Ok` proceeds to the next job, `Err` aborts the run.
pub type JobResult = Result<(), SyncError>;

/// Boxed future produced by a job.
pub type JobFuture = Pin<Box<dyn Future<Output = JobResult> + Send + 'static>>;

/// A labelled, not-yet-started piece of asynchronous work.
///
/// The future is lazy: building a `Job` never performs any I/O. Everything the
/// job needs is captured by value when it is built, so a batch of jobs built
/// in a loop each own their own data.
///
/// ```rust,ignore
/// use review_timeline_sync::core::Job;
///
/// let job = Job::new("save pins", async move {
///     store.set("timeline_pins", encoded)?;
///     Ok(())
/// });
/// sequencer.enqueue(job);
/// ```
pub struct Job {
    label: String,
    future: JobFuture,
}

impl Job {
    /// Wrap a future as a job.
    pub fn new<F>(label: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = JobResult> + Send + 'static,
    {
        Self {
            label: label.into(),
            future: Box::pin(future),
        }
    }

    /// A job that proceeds immediately.
    pub fn noop(label: impl Into<String>) -> Self {
        Self::new(label, async { Ok(()) })
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_parts(self) -> (String, JobFuture) {
        (self.label, self.future)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("label", &self.label).finish_non_exhaustive()
    }
}
