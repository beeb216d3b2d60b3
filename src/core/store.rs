//! Named blob storage used for the state that survives between runs.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::SyncError;

/// Get/set-by-name string store.
pub trait BlobStore: Send + Sync {
    /// Read a record; `Ok(None)` when it does not exist.
    fn get(&self, name: &str) -> Result<Option<String>, SyncError>;
    /// Write a record, replacing any previous value.
    fn set(&self, name: &str, value: &str) -> Result<(), SyncError>;
    /// Delete a record if present.
    fn remove(&self, name: &str) -> Result<(), SyncError>;
}

/// Load and decode a JSON record, falling back to `default`.
///
/// A record that fails to decode is cleared and treated as absent, as is a
/// store that cannot be read.
pub fn load_object<T, S>(store: &S, name: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: BlobStore + ?Sized,
{
    let encoded = match store.get(name) {
        Ok(Some(encoded)) => encoded,
        Ok(None) => return default,
        Err(e) => {
            tracing::warn!(record = name, "could not read record: {e}");
            return default;
        }
    };
    match serde_json::from_str(&encoded) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(record = name, "clear corrupted record: {e}");
            if let Err(e) = store.remove(name) {
                tracing::warn!(record = name, "could not clear record: {e}");
            }
            default
        }
    }
}

/// Encode `value` as JSON and store it under `name`.
pub fn save_object<T, S>(store: &S, name: &str, value: &T) -> Result<(), SyncError>
where
    T: Serialize + ?Sized,
    S: BlobStore + ?Sized,
{
    let encoded =
        serde_json::to_string(value).map_err(|e| SyncError::Persistence(e.to_string()))?;
    store.set(name, &encoded)
}
