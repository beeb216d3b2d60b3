//! Infrastructure adapters for the provider, timeline, device channel and
//! blob store.

pub mod channel;
pub mod provider;
pub mod store;
pub mod timeline;

pub use channel::RecordingChannel;
pub use provider::{HttpReviewProvider, StaticProvider};
pub use store::{FileBlobStore, InMemoryBlobStore};
pub use timeline::{HttpTimelineService, InMemoryTimeline};
