//! Configuration models for the provider, timeline, forecast and storage.

pub mod sync;

pub use sync::{
    ProviderConfig, ReportConfig, ScheduleConfig, StorageConfig, SyncConfig, TimelineConfig,
};
