//! # Review Timeline Sync
//!
//! Publishes a spaced-repetition study provider's review forecast to a
//! wearable device's timeline and reports the outcome to the device.
//!
//! A sync run is a chain of jobs executed one at a time by a
//! [`JobSequencer`](core::JobSequencer). The chain fetches the account, the
//! study summary and the assignments; it then aggregates availability
//! timestamps into a bucketed forecast and reconciles that forecast against
//! the pins published by earlier runs. Creates and deletes are sent to the
//! timeline service and the record of known pins is saved only after all of
//! them succeed. Any failure aborts the rest of the chain and is reported to
//! the device.
//!
//! ## Key Features
//!
//! - **Single-flight sequencing**: at most one network or device operation
//!   in flight; one failure discards everything queued after it
//! - **Bounded forecast**: 15-minute buckets, cumulative counts and a
//!   two-day horizon
//! - **Minimal timeline traffic**: unchanged pins are not re-sent, stale pins
//!   are deleted, and long-gone pins are forgotten locally
//! - **Pluggable collaborators**: provider, timeline, device channel and blob
//!   store are traits with HTTP, file and in-memory adapters
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use review_timeline_sync::builders::build_pipeline;
//! use review_timeline_sync::config::SyncConfig;
//! use review_timeline_sync::runtime::{EventListener, TokioSpawner};
//!
//! review_timeline_sync::util::init_tracing();
//! let cfg = SyncConfig::from_env()?;
//! let pipeline = build_pipeline(&cfg, Arc::new(my_device_channel))?;
//! let events = EventListener::new(pipeline, TokioSpawner::current()).spawn(16);
//! // forward device events into `events`
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Job sequencing and collaborator traits.
pub mod core;
/// Configuration models for the provider, timeline, forecast and storage.
pub mod config;
/// Builders to construct sync pipelines from configuration.
pub mod builders;
/// Infrastructure adapters for the provider, timeline, device and storage.
pub mod infra;
/// Device progress, success and error reports.
pub mod report;
/// Sync pipeline, device event listener and task spawning.
pub mod runtime;
/// Forecast aggregation.
pub mod schedule;
/// Provider resource decoding.
pub mod study;
/// Timeline pins and reconciliation.
pub mod timeline;
/// Shared utilities.
pub mod util;
