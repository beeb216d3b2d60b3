//! Canned review provider for development/testing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::core::{ReviewProvider, SyncError};

/// Provider answering from a fixed table of resources.
#[derive(Debug, Default)]
pub struct StaticProvider {
    resources: Mutex<HashMap<String, Result<Value, String>>>,
    requests: Mutex<Vec<String>>,
}

impl StaticProvider {
    /// Provider with no resources; every request fails until one is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` for `resource`.
    #[must_use]
    pub fn with_resource(self, resource: impl Into<String>, data: Value) -> Self {
        self.resources.lock().insert(resource.into(), Ok(data));
        self
    }

    /// Answer `resource` with a provider error carrying `message`.
    #[must_use]
    pub fn with_error(self, resource: impl Into<String>, message: impl Into<String>) -> Self {
        self.resources
            .lock()
            .insert(resource.into(), Err(message.into()));
        self
    }

    /// Resources requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ReviewProvider for StaticProvider {
    async fn request(&self, resource: &str) -> Result<Value, SyncError> {
        self.requests.lock().push(resource.to_string());
        match self.resources.lock().get(resource) {
            Some(Ok(data)) => Ok(data.clone()),
            Some(Err(message)) => Err(SyncError::Provider(message.clone())),
            None => Err(SyncError::Provider("404 Not Found".into())),
        }
    }
}
