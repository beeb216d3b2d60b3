//! HTTP client for the public timeline API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;

use crate::config::TimelineConfig;
use crate::core::{SyncError, TimelineService};
use crate::timeline::{KnownEntryId, Pin};

/// `PUT`/`DELETE <base>/v1/user/pins/{id}` client.
pub struct HttpTimelineService {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct PinRef<'a> {
    id: &'a str,
}

impl HttpTimelineService {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &TimelineConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        token: &str,
        id: &str,
        body: &B,
    ) -> Result<(), SyncError> {
        let url = format!("{}/v1/user/pins/{id}", self.base_url);
        let failure = || SyncError::ExternalService(format!("Failed to {method} timeline pin."));

        let response = self
            .client
            .request(method.clone(), &url)
            .header("X-User-Token", token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%url, "timeline request failed: {e}");
                failure()
            })?;

        if response.status() == StatusCode::OK {
            return Ok(());
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        tracing::error!(%url, %status, "timeline rejected request: {text}");
        Err(failure())
    }
}

#[async_trait]
impl TimelineService for HttpTimelineService {
    async fn put_pin(&self, token: &str, pin: &Pin) -> Result<(), SyncError> {
        self.send(Method::PUT, token, &pin.id, pin).await
    }

    async fn delete_pin(&self, token: &str, id: &KnownEntryId) -> Result<(), SyncError> {
        let id = id.to_string();
        self.send(Method::DELETE, token, &id, &PinRef { id: &id }).await
    }
}
