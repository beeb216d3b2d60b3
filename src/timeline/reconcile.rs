//! Diff the forecast against known pins and drive the resulting operations.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{BlobStore, Job, JobSequencer, TimelineService};
use crate::schedule::ScheduleEntry;

use super::pin::{revision, Pin, PinBuilder};
use super::{KnownEntryId, KnownEntrySet};

/// Default number of buckets below the base that stay tracked for deletion.
pub const DEFAULT_RETENTION_BUCKETS: i64 = 36;

/// A pin to create or replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinCreate {
    /// Bucket the pin covers.
    pub bucket: i64,
    /// Revision recorded once the pin is accepted.
    pub revision: String,
    /// Pin body.
    pub pin: Pin,
}

/// Operations needed to bring the timeline in line with a forecast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Earliest bucket of the forecast.
    pub base_bucket: Option<i64>,
    /// Pins to create or replace.
    pub creates: Vec<PinCreate>,
    /// Pins to delete.
    pub deletes: Vec<KnownEntryId>,
    /// Buckets forgotten locally without a network call.
    pub pruned: Vec<i64>,
}

impl ReconcilePlan {
    /// Whether the plan has no network operations.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.deletes.is_empty()
    }
}

/// Computes [`ReconcilePlan`]s.
#[derive(Debug, Clone)]
pub struct Reconciler {
    pins: PinBuilder,
    retention_buckets: i64,
}

impl Reconciler {
    /// Reconciler building pins with `pins` and tracking stale pins for
    /// `retention_buckets` below the base.
    pub const fn new(pins: PinBuilder, retention_buckets: i64) -> Self {
        Self {
            pins,
            retention_buckets,
        }
    }

    /// Plan creates for entries whose pin is missing or out of date and
    /// deletes for known pins before the forecast base.
    ///
    /// Known buckets older than the retention window are pruned from `known`
    /// immediately; every other change to `known` waits for the matching
    /// operation to succeed.
    pub fn reconcile(
        &self,
        schedule: &[ScheduleEntry],
        known: &mut KnownEntrySet,
        identity: &str,
    ) -> ReconcilePlan {
        let Some(base) = schedule.first().map(|e| e.time_bucket) else {
            return ReconcilePlan::default();
        };

        let creates = schedule
            .iter()
            .filter_map(|entry| {
                let revision = revision(entry);
                if known.revision(entry.time_bucket) == Some(revision.as_str()) {
                    return None;
                }
                Some(PinCreate {
                    bucket: entry.time_bucket,
                    revision,
                    pin: self.pins.build(identity, entry),
                })
            })
            .collect();

        let deletes = known
            .buckets_before(base)
            .into_iter()
            .map(|bucket| KnownEntryId::new(identity, bucket))
            .collect();

        let pruned = known.prune_before(base.saturating_sub(self.retention_buckets));
        for bucket in &pruned {
            tracing::debug!(bucket, "obliviate");
        }

        ReconcilePlan {
            base_bucket: Some(base),
            creates,
            deletes,
            pruned,
        }
    }
}

/// One timeline operation with everything it needs captured by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineOp {
    /// Put a pin.
    Create(PinCreate),
    /// Delete a pin.
    Delete(KnownEntryId),
}

impl TimelineOp {
    fn label(&self) -> String {
        match self {
            Self::Create(c) => format!("put pin {}", c.pin.id),
            Self::Delete(id) => format!("delete pin {id}"),
        }
    }

    fn into_job(
        self,
        timeline: Arc<dyn TimelineService>,
        token: String,
        known: Arc<Mutex<KnownEntrySet>>,
    ) -> Job {
        Job::new(self.label(), async move {
            match self {
                Self::Create(create) => {
                    timeline.put_pin(&token, &create.pin).await?;
                    let fresh = known.lock().insert(create.bucket, Some(create.revision));
                    if fresh {
                        tracing::info!(pin = %create.pin.id, time = %create.pin.time, "remember");
                    } else {
                        tracing::info!(pin = %create.pin.id, time = %create.pin.time, "affirm");
                    }
                }
                Self::Delete(id) => {
                    timeline.delete_pin(&token, &id).await?;
                    known.lock().remove(id.bucket());
                    tracing::info!(pin = %id, "forget");
                }
            }
            Ok(())
        })
    }
}

/// Turns a plan into sequencer jobs followed by a persistence job.
#[derive(Clone)]
pub struct TimelineDriver {
    timeline: Arc<dyn TimelineService>,
    store: Arc<dyn BlobStore>,
}

impl TimelineDriver {
    /// Driver writing pins to `timeline` and the known set to `store`.
    pub fn new(timeline: Arc<dyn TimelineService>, store: Arc<dyn BlobStore>) -> Self {
        Self { timeline, store }
    }

    /// Enqueue creates, then deletes, then one job saving `known`.
    ///
    /// Without a timeline token no network jobs are enqueued, but pruning is
    /// still persisted. Returns the number of network jobs enqueued.
    pub fn enqueue(
        &self,
        sequencer: &JobSequencer,
        plan: ReconcilePlan,
        token: Option<String>,
        known: &Arc<Mutex<KnownEntrySet>>,
    ) -> usize {
        let ops: Vec<TimelineOp> = plan
            .creates
            .into_iter()
            .map(TimelineOp::Create)
            .chain(plan.deletes.into_iter().map(TimelineOp::Delete))
            .collect();

        let enqueued = match token {
            Some(token) => {
                let count = ops.len();
                sequencer.enqueue_all(ops.into_iter().map(|op| {
                    op.into_job(Arc::clone(&self.timeline), token.clone(), Arc::clone(known))
                }));
                count
            }
            None => {
                if !ops.is_empty() {
                    tracing::warn!(skipped = ops.len(), "no timeline token; pins not pushed");
                }
                0
            }
        };

        let store = Arc::clone(&self.store);
        let known = Arc::clone(known);
        sequencer.enqueue(Job::new("save timeline pins", async move {
            let snapshot = known.lock().clone();
            tracing::info!(known = snapshot.len(), "save timeline pins");
            snapshot.save(store.as_ref())
        }));
        enqueued
    }
}
