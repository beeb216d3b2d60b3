//! Typed views of the review provider's resources.

pub mod resources;

pub use resources::{parse_assignments, parse_summary, parse_user, StudySummary, UserInfo};
