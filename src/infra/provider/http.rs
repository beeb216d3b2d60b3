//! HTTP client for the review provider API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::core::{ReviewProvider, SyncError};

/// Bearer-authenticated `GET <base>/<resource>` client.
///
/// Collections are read page by page through `pages.next_url`; a next link
/// outside the configured base URL is refused so the token never leaves it.
pub struct HttpReviewProvider {
    client: Client,
    base_url: String,
    token: String,
    revision_header: Option<(String, String)>,
}

impl HttpReviewProvider {
    /// Build a client from configuration and an API token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig, token: impl Into<String>) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;
        let revision_header = config
            .revision
            .as_ref()
            .map(|rev| (config.revision_header.clone(), rev.clone()));
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            revision_header,
        })
    }
}

/// Interpret a provider response.
///
/// A `data` field yields the data whatever the status; an `error.message`
/// field becomes the error text; anything else reports the raw status.
pub fn interpret_response(status: StatusCode, body: Option<Value>) -> Result<Value, SyncError> {
    if let Some(mut body) = body {
        if let Some(data) = body.get_mut("data") {
            return Ok(data.take());
        }
        if let Some(message) = body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
        {
            return Err(SyncError::Provider(message.to_string()));
        }
    }
    Err(SyncError::Provider(
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
    ))
}

/// Link to the page after this one, if the body has one.
pub fn next_page_url(body: Option<&Value>) -> Option<String> {
    body?
        .pointer("/pages/next_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

impl HttpReviewProvider {
    async fn get(
        &self,
        resource: &str,
        url: &str,
    ) -> Result<(StatusCode, Option<Value>), SyncError> {
        tracing::info!("GET {url}");

        let mut req = self.client.get(url).bearer_auth(&self.token);
        if let Some((name, value)) = &self.revision_header {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = req
            .send()
            .await
            .map_err(|e| SyncError::Provider(format!("request to {resource} failed: {e}")))?;
        let status = response.status();
        Ok((status, response.json::<Value>().await.ok()))
    }
}

#[async_trait]
impl ReviewProvider for HttpReviewProvider {
    async fn request(&self, resource: &str) -> Result<Value, SyncError> {
        let url = format!("{}/{resource}", self.base_url);
        let (status, body) = self.get(resource, &url).await?;
        interpret_response(status, body)
    }

    async fn request_collection(&self, resource: &str) -> Result<Vec<Value>, SyncError> {
        let mut records = Vec::new();
        let mut url = format!("{}/{resource}", self.base_url);
        let mut pages = 0usize;
        loop {
            let (status, body) = self.get(resource, &url).await?;
            let next = next_page_url(body.as_ref());
            match interpret_response(status, body)? {
                Value::Array(page) => records.extend(page),
                _ => return Err(SyncError::Provider(format!("{resource} is not a collection"))),
            }
            pages += 1;

            let Some(next) = next else { break };
            if !next.starts_with(&self.base_url) || next == url {
                return Err(SyncError::Provider(format!(
                    "unexpected next page for {resource}: {next}"
                )));
            }
            url = next;
        }
        tracing::debug!(resource, pages, records = records.len(), "collection received");
        Ok(records)
    }
}
