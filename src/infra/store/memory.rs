//! In-memory blob store.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::{BlobStore, SyncError};

/// Simple in-memory store for development/testing.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    records: Mutex<HashMap<String, String>>,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>, SyncError> {
        Ok(self.records.lock().get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), SyncError> {
        self.records.lock().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), SyncError> {
        self.records.lock().remove(name);
        Ok(())
    }
}
