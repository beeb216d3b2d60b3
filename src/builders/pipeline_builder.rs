//! Builders to construct sync pipelines from configuration.

use std::sync::Arc;

use anyhow::Context;

use crate::config::{ProviderConfig, SyncConfig};
use crate::core::{AppResult, DeviceChannel, ReviewProvider, SyncError};
use crate::infra::{FileBlobStore, HttpReviewProvider, HttpTimelineService};
use crate::runtime::{PipelineParts, ProviderFactory, SyncPipeline};
use crate::util::SystemClock;

/// Factory creating an HTTP provider client per API token.
pub fn http_provider_factory(config: ProviderConfig) -> ProviderFactory {
    Arc::new(
        move |token: &str| -> Result<Arc<dyn ReviewProvider>, SyncError> {
            let provider = HttpReviewProvider::new(&config, token)?;
            Ok(Arc::new(provider) as Arc<dyn ReviewProvider>)
        },
    )
}

/// Build the production pipeline: HTTP provider and timeline clients, a
/// file blob store under `storage.state_dir` and the system clock.
///
/// # Errors
///
/// Returns [`SyncError::Config`] for an invalid configuration or when an
/// HTTP client cannot be built, and [`SyncError::Persistence`] when the state
/// directory cannot be created.
pub fn build_pipeline(
    cfg: &SyncConfig,
    channel: Arc<dyn DeviceChannel>,
) -> Result<SyncPipeline, SyncError> {
    cfg.validate()
        .map_err(|e| SyncError::Config(format!("config invalid: {e}")))?;

    let store = FileBlobStore::new(&cfg.storage.state_dir)?;
    let timeline = HttpTimelineService::new(&cfg.timeline)?;
    tracing::info!(
        state_dir = %cfg.storage.state_dir.display(),
        provider = %cfg.provider.base_url,
        timeline = %cfg.timeline.base_url,
        "building sync pipeline"
    );

    build_pipeline_with(
        cfg,
        PipelineParts {
            channel,
            timeline: Arc::new(timeline),
            store: Arc::new(store),
            providers: http_provider_factory(cfg.provider.clone()),
            clock: Arc::new(SystemClock),
        },
    )
}

/// Build a pipeline over caller-supplied collaborators.
///
/// # Errors
///
/// Returns [`SyncError::Config`] for an invalid configuration.
pub fn build_pipeline_with(
    cfg: &SyncConfig,
    parts: PipelineParts,
) -> Result<SyncPipeline, SyncError> {
    cfg.validate()
        .map_err(|e| SyncError::Config(format!("config invalid: {e}")))?;
    Ok(SyncPipeline::new(parts, cfg))
}

/// Build the production pipeline from `.env` and `REVIEW_SYNC_*` variables.
///
/// # Errors
///
/// Fails when the environment holds an invalid configuration or the pipeline
/// cannot be built.
pub fn build_pipeline_from_env(channel: Arc<dyn DeviceChannel>) -> AppResult<SyncPipeline> {
    let cfg = SyncConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading sync configuration")?;
    build_pipeline(&cfg, channel).context("building sync pipeline")
}
