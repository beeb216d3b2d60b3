//! One sync run: fetch the study state, publish the forecast, report back.
//!
//! A run is a fixed chain of jobs on the pipeline's [`JobSequencer`]:
//!
//! 1. progress, then fetch `user` (the pin identity);
//! 2. progress, then fetch `summary` and `assignments`;
//! 3. progress, then acquire the timeline token;
//! 4. progress, then plan: aggregate, load known pins, reconcile and enqueue
//!    the pin jobs, the save job and the success message.
//!
//! Any abort reports the error to the device through the sequencer's abort
//! hook and a cancelled run reports [`SyncError::Cancelled`], so each run
//! ends with exactly one terminal message. Every enqueue goes through a
//! handle pinned to the run, so nothing from a cancelled run survives into
//! the next one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::core::{
    BlobStore, DeviceChannel, DrainOutcome, Job, JobSequencer, ReviewProvider, SyncError,
    TimelineService,
};
use crate::report::{forecast_message, ReportEmitter};
use crate::schedule::{BucketClock, RawAvailability, ScheduleAggregator, StudyItem};
use crate::study::{parse_assignments, parse_summary, parse_user, StudySummary};
use crate::timeline::{KnownEntrySet, PinBuilder, Reconciler, TimelineDriver};
use crate::util::Clock;

/// Builds a review provider client for an API token.
pub type ProviderFactory =
    Arc<dyn Fn(&str) -> Result<Arc<dyn ReviewProvider>, SyncError> + Send + Sync>;

/// Collaborators a pipeline runs against.
pub struct PipelineParts {
    /// Device messaging.
    pub channel: Arc<dyn DeviceChannel>,
    /// Timeline pins.
    pub timeline: Arc<dyn TimelineService>,
    /// Durable known-pin records.
    pub store: Arc<dyn BlobStore>,
    /// Review provider clients.
    pub providers: ProviderFactory,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}

/// What a completed run did.
///
/// Only built for [`RunOutcome::Completed`], which requires every pin job to
/// have proceeded, so the pin counts are confirmed rather than planned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pin identity (the account name).
    pub identity: String,
    /// Earliest bucket of the forecast.
    pub base_bucket: Option<i64>,
    /// Forecast entries.
    pub entries: usize,
    /// Pins created or replaced.
    pub pins_put: usize,
    /// Stale pins deleted.
    pub pins_deleted: usize,
    /// Known buckets forgotten without a network call.
    pub pruned: usize,
    /// Jobs the sequencer ran.
    pub jobs_run: usize,
}

/// How [`SyncPipeline::run_once`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No API token; the device was asked for one.
    NeedsConfiguration,
    /// Another run is in progress; nothing was done.
    Busy,
    /// Every job proceeded.
    Completed(RunSummary),
    /// A job aborted and the error was reported.
    Aborted(SyncError),
    /// [`SyncPipeline::cancel`] stopped the run.
    Cancelled,
}

#[derive(Default)]
struct RunContext {
    identity: Option<String>,
    summary: Option<StudySummary>,
    items: Vec<StudyItem>,
    timeline_token: Option<String>,
    report: RunSummary,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Inner {
    channel: Arc<dyn DeviceChannel>,
    store: Arc<dyn BlobStore>,
    providers: ProviderFactory,
    clock: Arc<dyn Clock>,
    sequencer: JobSequencer,
    reports: ReportEmitter,
    aggregator: ScheduleAggregator,
    reconciler: Reconciler,
    driver: TimelineDriver,
    credential: Mutex<Option<String>>,
    running: AtomicBool,
}

/// Review forecast to timeline synchronizer.
///
/// Cheap to clone; clones share the queue, the credential and the
/// single-flight flag.
#[derive(Clone)]
pub struct SyncPipeline {
    inner: Arc<Inner>,
}

impl SyncPipeline {
    /// Pipeline over `parts`, shaped by `config`. The config is assumed valid.
    pub fn new(parts: PipelineParts, config: &SyncConfig) -> Self {
        let clock = BucketClock::new(config.schedule.bucket_width_secs);
        let reports = ReportEmitter::new(Arc::clone(&parts.channel), config.report.max_error_len);
        let mut sequencer = JobSequencer::new().with_abort_hook(Arc::new(reports.clone()));
        if let Some(secs) = config.job_timeout_secs {
            sequencer = sequencer.with_job_timeout(Duration::from_secs(secs));
        }

        Self {
            inner: Arc::new(Inner {
                channel: parts.channel,
                driver: TimelineDriver::new(parts.timeline, Arc::clone(&parts.store)),
                store: parts.store,
                providers: parts.providers,
                clock: parts.clock,
                sequencer,
                reports,
                aggregator: ScheduleAggregator::new(clock, config.schedule.horizon_buckets),
                reconciler: Reconciler::new(
                    PinBuilder::new(clock, config.timeline.pin_title.clone()),
                    config.schedule.retention_buckets,
                ),
                credential: Mutex::new(config.provider.api_token.clone()),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Replace the API token used by later runs.
    pub fn set_credential(&self, api_token: Option<String>) {
        *self.inner.credential.lock() = api_token.filter(|t| !t.is_empty());
    }

    /// Whether an API token is configured.
    pub fn has_credential(&self) -> bool {
        self.inner.credential.lock().is_some()
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Queue shared by every run of this pipeline.
    pub fn sequencer(&self) -> &JobSequencer {
        &self.inner.sequencer
    }

    /// Device report emitter.
    pub fn reports(&self) -> &ReportEmitter {
        &self.inner.reports
    }

    /// Stop the current run. The job in flight finishes but nothing after it
    /// runs, including jobs it enqueues, so the known-pin records are left as
    /// they were. The run then reports [`SyncError::Cancelled`].
    pub fn cancel(&self) {
        tracing::info!("cancelling sync run");
        self.inner.sequencer.cancel_all();
    }

    /// Run one sync to completion.
    pub async fn run_once(&self) -> RunOutcome {
        let api_token = self.inner.credential.lock().clone();
        let Some(api_token) = api_token else {
            tracing::warn!("no API token configured");
            self.inner.reports.prompt_configure().await;
            return RunOutcome::NeedsConfiguration;
        };

        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("sync already in progress; refresh ignored");
            return RunOutcome::Busy;
        }
        let _running = RunningGuard(&self.inner.running);

        let run_id = Uuid::new_v4();
        self.run(&api_token)
            .instrument(tracing::info_span!("sync_run", %run_id))
            .await
    }

    async fn run(&self, api_token: &str) -> RunOutcome {
        let provider = match (self.inner.providers)(api_token) {
            Ok(provider) => provider,
            Err(e) => {
                self.inner.reports.report_error(&e).await;
                return RunOutcome::Aborted(e);
            }
        };

        let ctx = Arc::new(Mutex::new(RunContext::default()));
        let seq = self.inner.sequencer.pinned();
        self.enqueue_run(&seq, &provider, &ctx);

        match seq.start().await {
            DrainOutcome::Completed { jobs_run } => {
                let mut summary = ctx.lock().report.clone();
                summary.jobs_run = jobs_run;
                tracing::info!(
                    put = summary.pins_put,
                    deleted = summary.pins_deleted,
                    pruned = summary.pruned,
                    "sync complete"
                );
                RunOutcome::Completed(summary)
            }
            DrainOutcome::Aborted { error, .. } => RunOutcome::Aborted(error),
            DrainOutcome::Idle if seq.is_current() => {
                RunOutcome::Completed(RunSummary::default())
            }
            DrainOutcome::Cancelled { .. } | DrainOutcome::Idle => {
                self.inner.reports.report_error(&SyncError::Cancelled).await;
                RunOutcome::Cancelled
            }
            DrainOutcome::Busy => RunOutcome::Busy,
        }
    }

    fn enqueue_run(
        &self,
        seq: &JobSequencer,
        provider: &Arc<dyn ReviewProvider>,
        ctx: &Arc<Mutex<RunContext>>,
    ) {
        let inner = &self.inner;

        inner.reports.enqueue_progress(seq, "Consulting the Crabigator");
        seq.enqueue(fetch_user(Arc::clone(provider), Arc::clone(ctx)));

        inner.reports.enqueue_progress(seq, "Receiving the Summary");
        seq.enqueue(fetch_summary(
            Arc::clone(provider),
            Arc::clone(&inner.clock),
            Arc::clone(ctx),
        ));
        seq.enqueue(fetch_assignments(Arc::clone(provider), Arc::clone(ctx)));

        inner.reports.enqueue_progress(seq, "Altering the Timeline");
        seq.enqueue(acquire_timeline_token(
            Arc::clone(&inner.channel),
            Arc::clone(ctx),
        ));

        inner.reports.enqueue_progress(seq, "Pushing the Pins");
        let planner = Arc::clone(inner);
        let ctx = Arc::clone(ctx);
        let run_seq = seq.clone();
        // Needs the fetched data, so planning happens inside a job.
        seq.enqueue(Job::new("plan timeline", async move {
            planner.plan(&run_seq, &ctx)
        }));
    }
}

impl Inner {
    fn plan(&self, seq: &JobSequencer, ctx: &Mutex<RunContext>) -> Result<(), SyncError> {
        let (identity, summary, items, token) = {
            let mut ctx = ctx.lock();
            (
                ctx.identity.clone(),
                ctx.summary.clone(),
                std::mem::take(&mut ctx.items),
                ctx.timeline_token.clone(),
            )
        };
        let identity =
            identity.ok_or_else(|| SyncError::Provider("user was not received".into()))?;
        let summary =
            summary.ok_or_else(|| SyncError::Provider("summary was not received".into()))?;

        let now = self.clock.now();
        let clock = self.aggregator.clock();
        let now_bucket = clock.bucket_of_time(now);
        let cutoff_bucket = summary
            .next_reviews_at
            .map_or(now_bucket, |t| clock.bucket_of_time(t).max(now_bucket));

        let mut raw = RawAvailability::new(now.timestamp());
        raw.extend(items);
        let schedule = self
            .aggregator
            .aggregate(&raw, cutoff_bucket, summary.reviews_available);
        tracing::info!(
            items = raw.len(),
            entries = schedule.len(),
            base = ?schedule.first().map(|e| clock.iso(e.time_bucket)),
            "forecast ready"
        );

        let mut known = KnownEntrySet::load(self.store.as_ref());
        tracing::debug!(known = known.len(), "loaded timeline pins");
        let plan = self.reconciler.reconcile(&schedule, &mut known, &identity);
        let mut report = RunSummary {
            identity,
            base_bucket: plan.base_bucket,
            entries: schedule.len(),
            pins_put: plan.creates.len(),
            pins_deleted: plan.deletes.len(),
            pruned: plan.pruned.len(),
            jobs_run: 0,
        };

        let known = Arc::new(Mutex::new(known));
        if self.driver.enqueue(seq, plan, token, &known) == 0 {
            report.pins_put = 0;
            report.pins_deleted = 0;
        }
        self.reports.enqueue_success(
            seq,
            forecast_message(&schedule, summary.lessons_available, now_bucket),
        );
        ctx.lock().report = report;
        Ok(())
    }
}

fn fetch_user(provider: Arc<dyn ReviewProvider>, ctx: Arc<Mutex<RunContext>>) -> Job {
    Job::new("fetch user", async move {
        let user = parse_user(provider.request("user").await?)?;
        tracing::info!(user = %user.username, "received user");
        ctx.lock().identity = Some(user.username);
        Ok(())
    })
}

fn fetch_summary(
    provider: Arc<dyn ReviewProvider>,
    clock: Arc<dyn Clock>,
    ctx: Arc<Mutex<RunContext>>,
) -> Job {
    Job::new("fetch summary", async move {
        let summary = parse_summary(provider.request("summary").await?, clock.now())?;
        tracing::info!(
            lessons = summary.lessons_available,
            reviews = summary.reviews_available,
            next = ?summary.next_reviews_at,
            "received summary"
        );
        ctx.lock().summary = Some(summary);
        Ok(())
    })
}

fn fetch_assignments(provider: Arc<dyn ReviewProvider>, ctx: Arc<Mutex<RunContext>>) -> Job {
    Job::new("fetch assignments", async move {
        let records = provider.request_collection("assignments").await?;
        let items = parse_assignments(Value::Array(records))?;
        tracing::info!(count = items.len(), "received assignments");
        ctx.lock().items = items;
        Ok(())
    })
}

fn acquire_timeline_token(channel: Arc<dyn DeviceChannel>, ctx: Arc<Mutex<RunContext>>) -> Job {
    Job::new("acquire timeline token", async move {
        match channel.timeline_token().await {
            Ok(Some(token)) => {
                tracing::info!("acquired timeline token");
                ctx.lock().timeline_token = Some(token);
                Ok(())
            }
            Ok(None) => {
                tracing::warn!("device cannot provide a timeline token; pins will not be pushed");
                Ok(())
            }
            Err(e) => {
                tracing::error!("timeline token unavailable: {e}");
                Err(SyncError::ExternalService(
                    "Could not access timeline token.".into(),
                ))
            }
        }
    })
}
