//! Tests for configuration validation

use std::collections::HashMap;
use std::path::PathBuf;

use review_timeline_sync::config::SyncConfig;

#[test]
fn test_defaults_are_valid() {
    let cfg = SyncConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.schedule.bucket_width_secs, 900);
    assert_eq!(cfg.schedule.horizon_buckets, 192);
    assert_eq!(cfg.schedule.retention_buckets, 36);
    assert_eq!(cfg.report.max_error_len, 128);
    assert!(cfg.provider.api_token.is_none());
}

#[test]
fn test_bucket_width_must_be_a_minute() {
    let mut cfg = SyncConfig::default();
    cfg.schedule.bucket_width_secs = 59;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_values_rejected() {
    let mut cfg = SyncConfig::default();
    cfg.schedule.horizon_buckets = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = SyncConfig::default();
    cfg.report.max_error_len = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = SyncConfig::default();
    cfg.job_timeout_secs = Some(0);
    assert!(cfg.validate().is_err());

    let mut cfg = SyncConfig::default();
    cfg.provider.base_url.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_str_fills_defaults() {
    let cfg = SyncConfig::from_json_str(
        r#"{
            "provider": {"api_token": "pat"},
            "schedule": {"horizon_buckets": 96},
            "job_timeout_secs": 20
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.provider.api_token.as_deref(), Some("pat"));
    assert_eq!(cfg.provider.revision.as_deref(), Some("20170710"));
    assert_eq!(cfg.schedule.horizon_buckets, 96);
    assert_eq!(cfg.schedule.bucket_width_secs, 900);
    assert_eq!(cfg.job_timeout_secs, Some(20));
}

#[test]
fn test_from_json_str_rejects_invalid() {
    assert!(SyncConfig::from_json_str("{not json").is_err());
    assert!(SyncConfig::from_json_str(r#"{"schedule": {"bucket_width_secs": 1}}"#).is_err());
}

#[test]
fn test_overrides() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("REVIEW_SYNC_API_TOKEN", "pat-env"),
        ("REVIEW_SYNC_PROVIDER_URL", "http://localhost:1/v2"),
        ("REVIEW_SYNC_STATE_DIR", "/tmp/review-sync"),
        ("REVIEW_SYNC_JOB_TIMEOUT_SECS", "15"),
    ]);
    let mut cfg = SyncConfig::default();
    cfg.apply_overrides(|key| vars.get(key).map(ToString::to_string))
        .unwrap();

    assert_eq!(cfg.provider.api_token.as_deref(), Some("pat-env"));
    assert_eq!(cfg.provider.base_url, "http://localhost:1/v2");
    assert_eq!(cfg.storage.state_dir, PathBuf::from("/tmp/review-sync"));
    assert_eq!(cfg.job_timeout_secs, Some(15));
    assert_eq!(cfg.timeline.base_url, "https://timeline-api.rebble.io");
}

#[test]
fn test_bad_timeout_override_is_error() {
    let mut cfg = SyncConfig::default();
    let result = cfg.apply_overrides(|key| {
        (key == "REVIEW_SYNC_JOB_TIMEOUT_SECS").then(|| "soon".to_string())
    });
    assert!(result.is_err());
}

#[test]
fn test_empty_token_override_is_ignored() {
    let mut cfg = SyncConfig::default();
    cfg.apply_overrides(|key| (key == "REVIEW_SYNC_API_TOKEN").then(String::new))
        .unwrap();
    assert!(cfg.provider.api_token.is_none());
}
