//! Forecast summary message.

use serde_json::Value;

use crate::core::DeviceMessage;
use crate::schedule::ScheduleEntry;

use super::{
    BASE_BUCKET_KEY, LESSON_COUNT_KEY, REVIEW_COUNT_KEY, REVIEW_FORECAST_KEY, SUCCESS_KEY,
};

/// Largest per-entry count the device can display.
pub const MAX_FORECAST_COUNT: u32 = 255;

/// Terminal success message summarizing `schedule`.
///
/// The first entry is the base; every later entry with new items becomes an
/// `[offset from base, min(255, new)]` pair. An empty schedule reports
/// `fallback_base` with no reviews.
pub fn forecast_message(
    schedule: &[ScheduleEntry],
    lessons_available: u32,
    fallback_base: i64,
) -> DeviceMessage {
    let (base, review_count) = schedule
        .first()
        .map_or((fallback_base, 0), |e| (e.time_bucket, e.new_item_count));

    let forecast: Vec<Value> = schedule
        .iter()
        .skip(1)
        .filter(|e| e.new_item_count > 0)
        .flat_map(|e| {
            [
                Value::from(e.time_bucket - base),
                Value::from(e.new_item_count.min(MAX_FORECAST_COUNT)),
            ]
        })
        .collect();

    DeviceMessage::new()
        .with(SUCCESS_KEY, true)
        .with(BASE_BUCKET_KEY, base)
        .with(LESSON_COUNT_KEY, lessons_available)
        .with(REVIEW_COUNT_KEY, review_count)
        .with(REVIEW_FORECAST_KEY, forecast)
}
