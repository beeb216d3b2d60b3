//! Blob store backends.

pub mod file;
pub mod memory;

pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;
