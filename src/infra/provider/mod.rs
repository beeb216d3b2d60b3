//! Review provider adapters.

pub mod http;
pub mod memory;

pub use http::HttpReviewProvider;
pub use memory::StaticProvider;
