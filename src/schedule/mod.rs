//! Review forecast: time buckets and aggregation of raw item availability.

pub mod aggregate;
pub mod bucket;

pub use aggregate::{
    RawAvailability, ScheduleAggregator, ScheduleEntry, StudyItem, DEFAULT_HORIZON_BUCKETS,
};
pub use bucket::{BucketClock, DEFAULT_BUCKET_WIDTH_SECS};
