//! Fixed-width time buckets.

use chrono::{DateTime, SecondsFormat, Utc};

/// Default bucket width: 15 minutes.
pub const DEFAULT_BUCKET_WIDTH_SECS: i64 = 15 * 60;

/// Conversion between epoch seconds and bucket indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketClock {
    width_secs: i64,
}

impl Default for BucketClock {
    fn default() -> Self {
        Self {
            width_secs: DEFAULT_BUCKET_WIDTH_SECS,
        }
    }
}

impl BucketClock {
    /// Clock with the given width. Widths under one minute are raised to 60s.
    pub fn new(width_secs: u32) -> Self {
        Self {
            width_secs: i64::from(width_secs.max(60)),
        }
    }

    /// Bucket width in seconds.
    pub const fn width_secs(&self) -> i64 {
        self.width_secs
    }

    /// Bucket containing `epoch_secs`, rounding toward negative infinity.
    pub const fn bucket_of(&self, epoch_secs: i64) -> i64 {
        epoch_secs.div_euclid(self.width_secs)
    }

    /// Bucket containing `instant`.
    pub fn bucket_of_time(&self, instant: DateTime<Utc>) -> i64 {
        self.bucket_of(instant.timestamp())
    }

    /// First second of `bucket`.
    pub const fn start_secs(&self, bucket: i64) -> i64 {
        bucket.saturating_mul(self.width_secs)
    }

    /// `buckets` expressed in whole minutes.
    pub const fn minutes(&self, buckets: i64) -> i64 {
        buckets.saturating_mul(self.width_secs) / 60
    }

    /// Start of `bucket` as an RFC 3339 UTC string with millisecond precision.
    pub fn iso(&self, bucket: i64) -> String {
        DateTime::<Utc>::from_timestamp(self.start_secs(bucket), 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Number of buckets covering `days` days.
    pub const fn buckets_per_days(&self, days: i64) -> i64 {
        days * 24 * 3600 / self.width_secs
    }
}
