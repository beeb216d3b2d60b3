//! Device channel adapters.

pub mod memory;

pub use memory::RecordingChannel;
