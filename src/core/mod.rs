//! Core sequencing abstractions: jobs, the job sequencer and the collaborators
//! jobs talk to.

pub mod channel;
pub mod error;
pub mod job;
pub mod remote;
pub mod sequencer;
pub mod store;

pub use channel::{DeviceChannel, DeviceMessage};
pub use error::{AppResult, SyncError};
pub use job::{Job, JobFuture, JobResult};
pub use remote::{ReviewProvider, TimelineService};
pub use sequencer::{AbortHook, DrainOutcome, JobSequencer, SequencerState};
pub use store::{load_object, save_object, BlobStore};
