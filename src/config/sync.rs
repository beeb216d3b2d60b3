//! Sync configuration structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schedule::DEFAULT_HORIZON_BUCKETS;
use crate::timeline::DEFAULT_RETENTION_BUCKETS;

/// Review provider API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API root, e.g. `https://api.wanikani.com/v2`.
    pub base_url: String,
    /// Personal access token. Without one a run prompts for configuration.
    pub api_token: Option<String>,
    /// Header carrying the API revision.
    pub revision_header: String,
    /// API revision to request; no header is sent when absent.
    pub revision: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.wanikani.com/v2".into(),
            api_token: None,
            revision_header: "Wanikani-Revision".into(),
            revision: Some("20170710".into()),
            request_timeout_secs: 30,
        }
    }
}

/// Timeline API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// API root.
    pub base_url: String,
    /// Title shown on every pin.
    pub pin_title: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://timeline-api.rebble.io".into(),
            pin_title: "WaniKani Review".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Forecast shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Bucket width in seconds; at least 60.
    pub bucket_width_secs: u32,
    /// Buckets kept past the cutoff.
    pub horizon_buckets: i64,
    /// Buckets below the base for which stale pins stay tracked.
    pub retention_buckets: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            bucket_width_secs: 15 * 60,
            horizon_buckets: DEFAULT_HORIZON_BUCKETS,
            retention_buckets: DEFAULT_RETENTION_BUCKETS,
        }
    }
}

/// Device report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Longest error text sent to the device, in characters.
    pub max_error_len: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { max_error_len: 128 }
    }
}

/// Durable state location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the blob store records.
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".review-sync"),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Review provider.
    pub provider: ProviderConfig,
    /// Timeline service.
    pub timeline: TimelineConfig,
    /// Forecast shape.
    pub schedule: ScheduleConfig,
    /// Device reports.
    pub report: ReportConfig,
    /// Durable state.
    pub storage: StorageConfig,
    /// Abort a job that runs longer than this many seconds.
    pub job_timeout_secs: Option<u64>,
}

impl SyncConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        if self.provider.base_url.is_empty() {
            return Err("provider.base_url must not be empty".into());
        }
        if self.timeline.base_url.is_empty() {
            return Err("timeline.base_url must not be empty".into());
        }
        if self.provider.request_timeout_secs == 0 || self.timeline.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".into());
        }
        if self.schedule.bucket_width_secs < 60 {
            return Err("schedule.bucket_width_secs must be at least 60".into());
        }
        if self.schedule.horizon_buckets <= 0 {
            return Err("schedule.horizon_buckets must be greater than 0".into());
        }
        if self.schedule.retention_buckets < 0 {
            return Err("schedule.retention_buckets must not be negative".into());
        }
        if self.report.max_error_len == 0 {
            return Err("report.max_error_len must be greater than 0".into());
        }
        if self.job_timeout_secs == Some(0) {
            return Err("job_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `REVIEW_SYNC_*` environment variables, after
    /// loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `REVIEW_SYNC_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("REVIEW_SYNC_API_TOKEN").filter(|t| !t.is_empty()) {
            self.provider.api_token = Some(token);
        }
        if let Some(url) = lookup("REVIEW_SYNC_PROVIDER_URL") {
            self.provider.base_url = url;
        }
        if let Some(url) = lookup("REVIEW_SYNC_TIMELINE_URL") {
            self.timeline.base_url = url;
        }
        if let Some(dir) = lookup("REVIEW_SYNC_STATE_DIR") {
            self.storage.state_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("REVIEW_SYNC_JOB_TIMEOUT_SECS") {
            let secs = secs
                .parse()
                .map_err(|e| format!("REVIEW_SYNC_JOB_TIMEOUT_SECS: {e}"))?;
            self.job_timeout_secs = Some(secs);
        }
        Ok(())
    }
}
