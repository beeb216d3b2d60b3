//! Inbound device events.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::DeviceMessage;
use crate::report::REFRESH_KEY;

use super::{RunOutcome, Spawn, SyncPipeline};

/// Something the device or its settings page did.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// App message from the watch; a set `REFRESH` key asks for a run.
    AppMessage(DeviceMessage),
    /// The settings page was opened.
    ShowConfiguration,
    /// The settings page was closed, with the token entered if any.
    ConfigurationClosed {
        /// New API token; `None` when the page was dismissed.
        api_token: Option<String>,
    },
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Dispatches device events to a [`SyncPipeline`].
///
/// Runs are spawned so the listener keeps draining events; a refresh that
/// arrives while a run is in progress gets [`RunOutcome::Busy`] and is
/// dropped.
#[derive(Clone)]
pub struct EventListener<S> {
    pipeline: SyncPipeline,
    spawner: S,
}

impl<S> EventListener<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Listener driving `pipeline`, spawning runs on `spawner`.
    pub const fn new(pipeline: SyncPipeline, spawner: S) -> Self {
        Self { pipeline, spawner }
    }

    /// Handle one event and wait for any run it starts.
    pub async fn handle(&self, event: DeviceEvent) -> Option<RunOutcome> {
        handle_event(&self.pipeline, event).await
    }

    /// Consume events until every sender is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<DeviceEvent>) {
        while let Some(event) = events.recv().await {
            let pipeline = self.pipeline.clone();
            self.spawner.spawn(async move {
                if let Some(outcome) = handle_event(&pipeline, event).await {
                    tracing::debug!(?outcome, "device event handled");
                }
            });
        }
        tracing::info!("device event stream closed");
    }

    /// Start [`EventListener::run`] on the spawner and return the sender
    /// feeding it.
    pub fn spawn(self, capacity: usize) -> mpsc::Sender<DeviceEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let spawner = self.spawner.clone();
        spawner.spawn(self.run(rx));
        tx
    }
}

async fn handle_event(pipeline: &SyncPipeline, event: DeviceEvent) -> Option<RunOutcome> {
    match event {
        DeviceEvent::AppMessage(message) => {
            if message.get(REFRESH_KEY).is_some_and(is_set) {
                tracing::info!("Watch has requested study schedule update.");
                Some(pipeline.run_once().await)
            } else {
                tracing::debug!(keys = %message.keys_summary(), "app message ignored");
                None
            }
        }
        DeviceEvent::ShowConfiguration => {
            tracing::info!("Show configuration.");
            pipeline.reports().configuring().await;
            None
        }
        DeviceEvent::ConfigurationClosed {
            api_token: Some(api_token),
        } if !api_token.is_empty() => {
            tracing::info!("Receive configuration.");
            pipeline.set_credential(Some(api_token));
            Some(pipeline.run_once().await)
        }
        DeviceEvent::ConfigurationClosed { .. } => {
            tracing::info!("Configuration canceled.");
            pipeline.reports().configuration_cancelled().await;
            None
        }
    }
}
