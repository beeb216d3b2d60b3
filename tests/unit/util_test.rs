//! Tests for shared utilities

use review_timeline_sync::report::truncate_chars;
use review_timeline_sync::schedule::BucketClock;
use review_timeline_sync::util::{init_tracing, Clock, FixedClock, SystemClock};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_system_clock_is_after_epoch() {
    assert!(SystemClock.now().timestamp() > 0);
}

#[test]
fn test_fixed_clock_drives_buckets() {
    let clock = FixedClock::at_secs(1_714_558_800);
    assert_eq!(
        BucketClock::default().iso(BucketClock::default().bucket_of_time(clock.now())),
        "2024-05-01T10:15:00.000Z"
    );
}

#[test]
fn test_truncate_chars() {
    assert_eq!(truncate_chars("Could not access timeline token.", 10), "Could not ");
}
