//! Tests for runtime adapters

use std::time::Duration;

use review_timeline_sync::runtime::{Spawn, TokioSpawner};

#[tokio::test]
async fn test_tokio_spawner_runs_future() {
    let spawner = TokioSpawner::current();
    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        let _ = tx.send(42);
    });
    let value = tokio::time::timeout(Duration::from_secs(1), rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value, 42);
}
