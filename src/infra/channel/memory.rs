//! In-memory device channel that records delivered messages.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{DeviceChannel, DeviceMessage, SyncError};

/// Device channel for development/testing.
///
/// Every message is recorded; messages carrying a key listed with
/// [`RecordingChannel::reject_key`] are nacked.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    delivered: Mutex<Vec<DeviceMessage>>,
    rejected_keys: Mutex<Vec<String>>,
    token: Mutex<Option<String>>,
    token_error: Mutex<Option<String>>,
}

impl RecordingChannel {
    /// Channel without a timeline token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel handing out `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let channel = Self::new();
        *channel.token.lock() = Some(token.into());
        channel
    }

    /// Nack any later message containing `key`.
    pub fn reject_key(&self, key: impl Into<String>) {
        self.rejected_keys.lock().push(key.into());
    }

    /// Fail timeline token requests with `message`.
    pub fn fail_token(&self, message: impl Into<String>) {
        *self.token_error.lock() = Some(message.into());
    }

    /// Messages acknowledged so far, in delivery order.
    pub fn delivered(&self) -> Vec<DeviceMessage> {
        self.delivered.lock().clone()
    }

    /// Delivered messages containing `key`.
    pub fn delivered_with(&self, key: &str) -> Vec<DeviceMessage> {
        self.delivered
            .lock()
            .iter()
            .filter(|m| m.contains(key))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeviceChannel for RecordingChannel {
    async fn send(&self, message: &DeviceMessage) -> Result<(), SyncError> {
        let rejected = self
            .rejected_keys
            .lock()
            .iter()
            .find(|k| message.contains(k))
            .cloned();
        if let Some(key) = rejected {
            return Err(SyncError::Channel(format!("device rejected `{key}` message")));
        }
        self.delivered.lock().push(message.clone());
        Ok(())
    }

    async fn timeline_token(&self) -> Result<Option<String>, SyncError> {
        if let Some(message) = self.token_error.lock().clone() {
            return Err(SyncError::Channel(message));
        }
        Ok(self.token.lock().clone())
    }
}
