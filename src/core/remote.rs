//! Remote services the pipeline talks to.

use async_trait::async_trait;
use serde_json::Value;

use super::SyncError;
use crate::timeline::{KnownEntryId, Pin};

/// Read access to the review provider's API.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Fetch a named resource (`user`, `summary`, `assignments`, ...) and
    /// return its `data` field.
    async fn request(&self, resource: &str) -> Result<Value, SyncError>;

    /// Fetch every record of a collection resource.
    ///
    /// Paginated providers follow their page links until the last page; the
    /// default treats the `data` of a single [`request`](Self::request) as
    /// the whole collection.
    async fn request_collection(&self, resource: &str) -> Result<Vec<Value>, SyncError> {
        match self.request(resource).await? {
            Value::Array(records) => Ok(records),
            _ => Err(SyncError::Provider(format!("{resource} is not a collection"))),
        }
    }
}

/// Write access to the device's timeline.
#[async_trait]
pub trait TimelineService: Send + Sync {
    /// Create or replace a pin.
    async fn put_pin(&self, token: &str, pin: &Pin) -> Result<(), SyncError>;
    /// Remove a pin.
    async fn delete_pin(&self, token: &str, id: &KnownEntryId) -> Result<(), SyncError>;
}
