//! Tests for error types

use review_timeline_sync::core::{AppResult, SyncError};

#[test]
fn test_error_display() {
    assert_eq!(
        SyncError::Provider("401 Unauthorized".into()).to_string(),
        "provider error: 401 Unauthorized"
    );
    assert_eq!(
        SyncError::Timeout("fetch user".into()).to_string(),
        "job `fetch user` timed out"
    );
}

#[test]
fn test_device_text() {
    assert_eq!(
        SyncError::ExternalService("Failed to PUT timeline pin.".into()).device_text(),
        "Failed to PUT timeline pin."
    );
    assert_eq!(
        SyncError::Channel("nack".into()).device_text(),
        "Could not reach the watch."
    );
    assert_eq!(
        SyncError::Persistence("disk full".into()).device_text(),
        "Could not save timeline state."
    );
    assert_eq!(
        SyncError::Timeout("fetch summary".into()).device_text(),
        "Timed out: fetch summary"
    );
    assert_eq!(SyncError::Cancelled.device_text(), "Sync cancelled.");
}

#[test]
fn test_converts_into_app_result() {
    fn fails() -> AppResult<()> {
        Err(SyncError::Config("missing token".into()).into())
    }
    let err = fails().unwrap_err();
    assert_eq!(
        err.downcast_ref::<SyncError>(),
        Some(&SyncError::Config("missing token".into()))
    );
}
