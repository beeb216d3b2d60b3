//! Device channel abstraction and the message mapping it carries.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SyncError;

/// Key/value message exchanged with the device.
///
/// Keys are the device's message keys (`PROGRESS`, `SUCCESS`, `ERROR`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMessage(BTreeMap<String, Value>);

impl DeviceMessage {
    /// Empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Comma-separated list of keys, for log lines.
    pub fn keys_summary(&self) -> String {
        self.0.keys().map(String::as_str).collect::<Vec<_>>().join(",")
    }

    /// Borrow the underlying mapping.
    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }
}

/// Messaging channel to the device.
///
/// `send` resolves `Ok` when the device acknowledged the message and
/// `Err(SyncError::Channel)` when it was rejected.
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    /// Deliver a message and wait for ack/nack.
    async fn send(&self, message: &DeviceMessage) -> Result<(), SyncError>;

    /// Per-session timeline token. `Ok(None)` when the device cannot
    /// provide one (e.g. an emulator).
    async fn timeline_token(&self) -> Result<Option<String>, SyncError>;
}
