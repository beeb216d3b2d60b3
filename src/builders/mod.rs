//! Builders to construct the sync pipeline from configuration.

pub mod pipeline_builder;

pub use pipeline_builder::{
    build_pipeline, build_pipeline_from_env, build_pipeline_with, http_provider_factory,
};
