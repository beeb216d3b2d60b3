//! Tests for pipeline builders

use std::sync::Arc;

use review_timeline_sync::builders::{build_pipeline, http_provider_factory};
use review_timeline_sync::config::{ProviderConfig, SyncConfig};
use review_timeline_sync::core::SyncError;
use review_timeline_sync::infra::RecordingChannel;

#[test]
fn test_build_pipeline_creates_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = SyncConfig::default();
    cfg.storage.state_dir = dir.path().join("state");
    cfg.provider.api_token = Some("pat".into());

    let pipeline = build_pipeline(&cfg, Arc::new(RecordingChannel::new())).unwrap();
    assert!(pipeline.has_credential());
    assert!(!pipeline.is_running());
    assert!(dir.path().join("state").is_dir());
}

#[test]
fn test_build_pipeline_rejects_invalid_config() {
    let mut cfg = SyncConfig::default();
    cfg.schedule.horizon_buckets = -1;
    let err = build_pipeline(&cfg, Arc::new(RecordingChannel::new()))
        .err()
        .unwrap();
    assert!(matches!(err, SyncError::Config(msg) if msg.starts_with("config invalid")));
}

#[test]
fn test_http_provider_factory_builds_clients() {
    let factory = http_provider_factory(ProviderConfig::default());
    assert!(factory("pat").is_ok());
}
