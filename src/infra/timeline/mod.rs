//! Timeline service adapters.

pub mod http;
pub mod memory;

pub use http::HttpTimelineService;
pub use memory::InMemoryTimeline;
