//! In-memory timeline that records pin operations.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{SyncError, TimelineService};
use crate::timeline::{KnownEntryId, Pin};

/// Timeline for development/testing with per-pin failure injection.
#[derive(Debug, Default)]
pub struct InMemoryTimeline {
    pins: Mutex<BTreeMap<String, Pin>>,
    log: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryTimeline {
    /// Empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later request for pin `id` fail.
    pub fn fail_pin(&self, id: impl Into<String>) {
        self.failing.lock().insert(id.into());
    }

    /// Pins currently on the timeline, keyed by id.
    pub fn pins(&self) -> BTreeMap<String, Pin> {
        self.pins.lock().clone()
    }

    /// Requests in order, as `PUT <id>` / `DELETE <id>`.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn check(&self, method: &str, id: &str) -> Result<(), SyncError> {
        self.log.lock().push(format!("{method} {id}"));
        if self.failing.lock().contains(id) {
            return Err(SyncError::ExternalService(format!(
                "Failed to {method} timeline pin."
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TimelineService for InMemoryTimeline {
    async fn put_pin(&self, _token: &str, pin: &Pin) -> Result<(), SyncError> {
        self.check("PUT", &pin.id)?;
        self.pins.lock().insert(pin.id.clone(), pin.clone());
        Ok(())
    }

    async fn delete_pin(&self, _token: &str, id: &KnownEntryId) -> Result<(), SyncError> {
        let id = id.to_string();
        self.check("DELETE", &id)?;
        self.pins.lock().remove(&id);
        Ok(())
    }
}
