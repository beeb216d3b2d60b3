//! Progress, success and error reports sent to the device.

pub mod emitter;
pub mod forecast;

pub use emitter::{truncate_chars, ReportEmitter, CONFIGURE_PROMPT};
pub use forecast::{forecast_message, MAX_FORECAST_COUNT};

/// Progress text key.
pub const PROGRESS_KEY: &str = "PROGRESS";
/// Terminal success flag key.
pub const SUCCESS_KEY: &str = "SUCCESS";
/// Terminal error text key.
pub const ERROR_KEY: &str = "ERROR";
/// Configuration prompt key.
pub const CONFIGURE_KEY: &str = "CONFIGURE";
/// Inbound key asking for a sync run.
pub const REFRESH_KEY: &str = "REFRESH";
/// Bucket the forecast offsets are relative to.
pub const BASE_BUCKET_KEY: &str = "BASE_BUCKET";
/// Lessons available now.
pub const LESSON_COUNT_KEY: &str = "LESSON_COUNT";
/// Reviews in the base bucket.
pub const REVIEW_COUNT_KEY: &str = "REVIEW_COUNT";
/// Flattened `[offset, count]` pairs.
pub const REVIEW_FORECAST_KEY: &str = "REVIEW_FORECAST";
