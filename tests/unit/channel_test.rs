//! Tests for the in-memory adapters

use review_timeline_sync::core::{DeviceChannel, DeviceMessage, ReviewProvider, SyncError};
use review_timeline_sync::infra::{RecordingChannel, StaticProvider};
use serde_json::json;

#[tokio::test]
async fn test_recording_channel_acks_and_records() {
    let channel = RecordingChannel::with_token("tl");
    let msg = DeviceMessage::new().with("PROGRESS", "Pushing the Pins");
    channel.send(&msg).await.unwrap();

    assert_eq!(channel.delivered(), vec![msg]);
    assert_eq!(channel.timeline_token().await, Ok(Some("tl".into())));
}

#[tokio::test]
async fn test_recording_channel_nacks_rejected_keys() {
    let channel = RecordingChannel::new();
    channel.reject_key("SUCCESS");

    let err = channel
        .send(&DeviceMessage::new().with("SUCCESS", true))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Channel(_)));
    assert!(channel.delivered().is_empty());
    assert_eq!(channel.timeline_token().await, Ok(None));
}

#[tokio::test]
async fn test_static_provider_answers_from_table() {
    let provider = StaticProvider::new()
        .with_resource("user", json!({"username": "koichi"}))
        .with_error("summary", "Unauthorized. Nice try.");

    assert_eq!(
        provider.request("user").await,
        Ok(json!({"username": "koichi"}))
    );
    assert_eq!(
        provider.request("summary").await,
        Err(SyncError::Provider("Unauthorized. Nice try.".into()))
    );
    assert_eq!(
        provider.request("reviews").await,
        Err(SyncError::Provider("404 Not Found".into()))
    );
    assert_eq!(provider.requests(), vec!["user", "summary", "reviews"]);
}

#[test]
fn test_message_keys_summary() {
    let msg = DeviceMessage::new()
        .with("SUCCESS", true)
        .with("BASE_BUCKET", 10);
    assert_eq!(msg.keys_summary(), "BASE_BUCKET,SUCCESS");
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({"SUCCESS": true, "BASE_BUCKET": 10})
    );
}
