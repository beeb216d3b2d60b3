//! Bucketed, cumulative review forecast.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::BucketClock;

/// Default forecast horizon: two days of 15-minute buckets.
pub const DEFAULT_HORIZON_BUCKETS: i64 = 2 * 24 * 4;

/// One study item as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyItem {
    /// When the item becomes reviewable, epoch seconds.
    pub available_at: Option<i64>,
    /// Finished items never enter the schedule.
    pub burned: bool,
}

impl StudyItem {
    /// Reviewable item available at `epoch_secs`.
    pub const fn at(epoch_secs: i64) -> Self {
        Self {
            available_at: Some(epoch_secs),
            burned: false,
        }
    }

    /// Burned item.
    pub const fn burned_at(epoch_secs: i64) -> Self {
        Self {
            available_at: Some(epoch_secs),
            burned: true,
        }
    }
}

/// Items accumulated during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAvailability {
    /// Instant the data describes as "now", epoch seconds.
    pub observed_at: i64,
    /// Collected items.
    pub items: Vec<StudyItem>,
}

impl RawAvailability {
    /// Empty container observed at `observed_at`.
    pub const fn new(observed_at: i64) -> Self {
        Self {
            observed_at,
            items: Vec::new(),
        }
    }

    /// Append items.
    pub fn extend(&mut self, items: impl IntoIterator<Item = StudyItem>) {
        self.items.extend(items);
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items were collected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One bucket of the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Bucket index.
    pub time_bucket: i64,
    /// Items becoming available in this bucket.
    pub new_item_count: u32,
    /// Running total up to and including this bucket.
    pub cumulative_item_count: u32,
    /// Buckets until the next entry; `None` when open-ended.
    pub duration_buckets: Option<i64>,
    /// Bucket of the next entry; `None` when open-ended.
    pub expiration_bucket: Option<i64>,
}

/// Turns raw availability into a forecast.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleAggregator {
    clock: BucketClock,
    horizon_buckets: i64,
}

impl Default for ScheduleAggregator {
    fn default() -> Self {
        Self::new(BucketClock::default(), DEFAULT_HORIZON_BUCKETS)
    }
}

impl ScheduleAggregator {
    /// Aggregator using `clock` and keeping `horizon_buckets` past the cutoff.
    pub const fn new(clock: BucketClock, horizon_buckets: i64) -> Self {
        Self {
            clock,
            horizon_buckets,
        }
    }

    /// The bucket clock in use.
    pub const fn clock(&self) -> BucketClock {
        self.clock
    }

    /// Compute the forecast.
    ///
    /// Items in or before `cutoff_bucket` are already counted by
    /// `reviews_available_now` and are skipped, unless nothing is available
    /// now, in which case every unburned item is counted. The "now" entry
    /// carrying `reviews_available_now` shares a bucket with item counts when
    /// they coincide, so buckets stay unique.
    ///
    /// Skipping relies on the provider's "available now" count covering every
    /// item up to the cutoff. If it reports reviews while the cutoff lies in
    /// the future, items between now and the cutoff are not counted.
    pub fn aggregate(
        &self,
        items: &RawAvailability,
        cutoff_bucket: i64,
        reviews_available_now: u32,
    ) -> Vec<ScheduleEntry> {
        let mut tally: BTreeMap<i64, u32> = BTreeMap::new();
        let mut skipped = 0usize;
        for item in &items.items {
            if item.burned {
                continue;
            }
            let Some(available_at) = item.available_at else {
                continue;
            };
            let bucket = self.clock.bucket_of(available_at);
            if bucket <= cutoff_bucket && reviews_available_now != 0 {
                skipped += 1;
                continue;
            }
            let count = tally.entry(bucket).or_default();
            *count = count.saturating_add(1);
        }
        if skipped > 0 {
            tracing::debug!(skipped, cutoff_bucket, "items covered by available reviews");
        }

        let now_bucket = self.clock.bucket_of(items.observed_at);
        let now = tally.entry(now_bucket).or_default();
        *now = now.saturating_add(reviews_available_now);

        let mut schedule: Vec<ScheduleEntry> = Vec::with_capacity(tally.len());
        let mut running = 0u32;
        for (time_bucket, new_item_count) in tally {
            running = running.saturating_add(new_item_count);
            if let Some(prev) = schedule.last_mut() {
                prev.duration_buckets = Some(time_bucket - prev.time_bucket);
                prev.expiration_bucket = Some(time_bucket);
            }
            schedule.push(ScheduleEntry {
                time_bucket,
                new_item_count,
                cumulative_item_count: running,
                duration_buckets: None,
                expiration_bucket: None,
            });
        }

        let horizon = cutoff_bucket.saturating_add(self.horizon_buckets);
        schedule.retain(|entry| entry.time_bucket < horizon);
        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const T0: i64 = 1_700_000_100;

    fn aggregator() -> ScheduleAggregator {
        ScheduleAggregator::default()
    }

    fn raw(observed_at: i64, items: &[StudyItem]) -> RawAvailability {
        let mut raw = RawAvailability::new(observed_at);
        raw.extend(items.iter().copied());
        raw
    }

    #[test]
    fn test_burned_items_are_excluded() {
        let clock = BucketClock::default();
        let now = T0 - 3600;
        let items = raw(
            now,
            &[StudyItem::at(T0), StudyItem::at(T0), StudyItem::burned_at(T0 + 900)],
        );

        let schedule = aggregator().aggregate(&items, clock.bucket_of(now), 0);

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].time_bucket, clock.bucket_of(now));
        assert_eq!(schedule[0].new_item_count, 0);
        assert_eq!(schedule[0].cumulative_item_count, 0);
        assert_eq!(schedule[1].time_bucket, clock.bucket_of(T0));
        assert_eq!(schedule[1].new_item_count, 2);
        assert_eq!(schedule[1].cumulative_item_count, 2);
        assert!(schedule.iter().all(|e| e.time_bucket != clock.bucket_of(T0 + 900)));
    }

    #[test]
    fn test_empty_input_yields_single_open_entry() {
        let schedule = aggregator().aggregate(&RawAvailability::new(T0), 0, 0);
        assert_eq!(
            schedule,
            vec![ScheduleEntry {
                time_bucket: BucketClock::default().bucket_of(T0),
                new_item_count: 0,
                cumulative_item_count: 0,
                duration_buckets: None,
                expiration_bucket: None,
            }]
        );
    }

    #[test]
    fn test_items_at_or_before_cutoff_skipped_when_reviews_available() {
        let clock = BucketClock::default();
        let cutoff = clock.bucket_of(T0);
        let items = raw(
            T0 - 1800,
            &[StudyItem::at(T0 - 900), StudyItem::at(T0), StudyItem::at(T0 + 900)],
        );

        let schedule = aggregator().aggregate(&items, cutoff, 5);

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].new_item_count, 5);
        assert_eq!(schedule[1].time_bucket, cutoff + 1);
        assert_eq!(schedule[1].new_item_count, 1);
        assert_eq!(schedule[1].cumulative_item_count, 6);
    }

    #[test]
    fn test_now_bucket_merges_with_items() {
        let clock = BucketClock::default();
        let items = raw(T0, &[StudyItem::at(T0)]);
        let schedule = aggregator().aggregate(&items, clock.bucket_of(T0) - 1, 3);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].new_item_count, 4);
    }

    #[test]
    fn test_durations_and_expirations() {
        let clock = BucketClock::default();
        let items = raw(
            T0,
            &[StudyItem::at(T0 + 900 * 4), StudyItem::at(T0 + 900 * 10), StudyItem::at(T0 + 900 * 10)],
        );
        let schedule = aggregator().aggregate(&items, clock.bucket_of(T0), 0);

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[0].duration_buckets, Some(4));
        assert_eq!(schedule[0].expiration_bucket, Some(schedule[1].time_bucket));
        assert_eq!(schedule[1].duration_buckets, Some(6));
        assert_eq!(schedule[2].duration_buckets, None);
        assert_eq!(schedule[2].expiration_bucket, None);
        assert_eq!(schedule[2].cumulative_item_count, 3);
    }

    #[test]
    fn test_horizon_drops_far_entries() {
        let clock = BucketClock::default();
        let cutoff = clock.bucket_of(T0);
        let items = raw(
            T0,
            &[
                StudyItem::at(T0 + 900 * 191),
                StudyItem::at(T0 + 900 * 192),
                StudyItem::at(T0 + 900 * 400),
            ],
        );
        let schedule = aggregator().aggregate(&items, cutoff, 0);

        assert_eq!(schedule.len(), 2);
        let last = schedule[1];
        assert_eq!(last.time_bucket, cutoff + 191);
        // The retained tail keeps its gap to the first dropped entry.
        assert_eq!(last.expiration_bucket, Some(cutoff + 192));
    }

    #[test]
    fn test_items_without_timestamp_are_ignored() {
        let items = raw(
            T0,
            &[StudyItem {
                available_at: None,
                burned: false,
            }],
        );
        let schedule = aggregator().aggregate(&items, 0, 0);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].cumulative_item_count, 0);
    }

    #[test]
    fn test_random_inputs_hold_forecast_invariants() {
        let clock = BucketClock::default();
        let mut rng = rand::rng();
        for _ in 0..200 {
            let now = T0 + rng.random_range(0..900 * 8);
            let cutoff = clock.bucket_of(now) + rng.random_range(0..4);
            let reviews: u32 = if rng.random_bool(0.5) { 0 } else { rng.random_range(1..50) };
            let items: Vec<StudyItem> = (0..rng.random_range(0..60))
                .map(|_| StudyItem {
                    available_at: Some(T0 + rng.random_range(0..900 * 150)),
                    burned: rng.random_bool(0.2),
                })
                .collect();
            let input = raw(now, &items);

            let schedule = aggregator().aggregate(&input, cutoff, reviews);

            assert!(!schedule.is_empty());
            for pair in schedule.windows(2) {
                assert!(pair[0].time_bucket < pair[1].time_bucket);
                assert_eq!(pair[0].duration_buckets, Some(pair[1].time_bucket - pair[0].time_bucket));
                assert_eq!(pair[0].expiration_bucket, Some(pair[1].time_bucket));
                assert_eq!(
                    pair[1].cumulative_item_count,
                    pair[0].cumulative_item_count + pair[1].new_item_count
                );
            }

            let included = items
                .iter()
                .filter(|i| !i.burned)
                .filter(|i| {
                    let bucket = clock.bucket_of(i.available_at.unwrap_or_default());
                    bucket > cutoff || reviews == 0
                })
                .count();
            let total: u32 = schedule.iter().map(|e| e.new_item_count).sum();
            assert_eq!(total as usize, reviews as usize + included);
        }
    }
}
