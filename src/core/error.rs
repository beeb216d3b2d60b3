//! Error types for sync runs.

use thiserror::Error;

/// Errors produced by pipeline jobs and their collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The review provider answered with an error or an unexpected shape.
    #[error("provider error: {0}")]
    Provider(String),
    /// A message could not be delivered to the device.
    #[error("channel error: {0}")]
    Channel(String),
    /// A timeline create/delete request failed.
    #[error("external service error: {0}")]
    ExternalService(String),
    /// The blob store could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// A job did not complete within the configured timeout.
    #[error("job `{0}` timed out")]
    Timeout(String),
    /// Configuration is missing or invalid.
    #[error("config error: {0}")]
    Config(String),
    /// The run was cancelled before it finished.
    #[error("sync run cancelled")]
    Cancelled,
}

impl SyncError {
    /// Text shown on the device for this error, before truncation.
    pub fn device_text(&self) -> String {
        match self {
            Self::Provider(msg) | Self::ExternalService(msg) => msg.clone(),
            Self::Channel(_) => "Could not reach the watch.".into(),
            Self::Persistence(_) => "Could not save timeline state.".into(),
            Self::Timeout(label) => format!("Timed out: {label}"),
            Self::Config(msg) => msg.clone(),
            Self::Cancelled => "Sync cancelled.".into(),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
