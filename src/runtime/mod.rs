//! Runtime adapters: task spawning, the sync pipeline and the device event
//! listener.

use std::future::Future;

pub mod listener;
pub mod pipeline;
pub mod tokio_spawner;

pub use listener::{DeviceEvent, EventListener};
pub use pipeline::{PipelineParts, ProviderFactory, RunOutcome, RunSummary, SyncPipeline};
pub use tokio_spawner::TokioSpawner;

/// Abstraction over task spawning.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
