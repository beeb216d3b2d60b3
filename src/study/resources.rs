//! Decoding of the `user`, `summary` and `assignments` resources.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::core::SyncError;
use crate::schedule::StudyItem;

/// The account the forecast belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    /// Account name; used as the pin identity.
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct SubjectGroup {
    available_at: DateTime<Utc>,
    #[serde(default)]
    subject_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(default)]
    lessons: Vec<SubjectGroup>,
    #[serde(default)]
    next_reviews_at: Option<DateTime<Utc>>,
    #[serde(default)]
    reviews: Vec<SubjectGroup>,
}

#[derive(Debug, Deserialize)]
struct AssignmentData {
    #[serde(default)]
    available_at: Option<DateTime<Utc>>,
    #[serde(default)]
    burned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AssignmentRecord {
    data: AssignmentData,
}

/// Study state at the time of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySummary {
    /// Lessons that can be started now.
    pub lessons_available: u32,
    /// Reviews that can be done now.
    pub reviews_available: u32,
    /// Next time reviews become available, if any are scheduled.
    pub next_reviews_at: Option<DateTime<Utc>>,
}

fn decode<T: DeserializeOwned>(resource: &str, data: Value) -> Result<T, SyncError> {
    serde_json::from_value(data)
        .map_err(|e| SyncError::Provider(format!("unexpected {resource} payload: {e}")))
}

fn count(groups: impl Iterator<Item = SubjectGroup>) -> u32 {
    let total: usize = groups.map(|g| g.subject_ids.len()).sum();
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Decode the `user` resource.
pub fn parse_user(data: Value) -> Result<UserInfo, SyncError> {
    decode("user", data)
}

/// Decode the `summary` resource as seen at `now`.
pub fn parse_summary(data: Value, now: DateTime<Utc>) -> Result<StudySummary, SyncError> {
    let summary: SummaryData = decode("summary", data)?;
    Ok(StudySummary {
        lessons_available: count(
            summary
                .lessons
                .into_iter()
                .filter(|g| g.available_at <= now),
        ),
        reviews_available: count(
            summary
                .reviews
                .into_iter()
                .filter(|g| g.available_at <= now),
        ),
        next_reviews_at: summary.next_reviews_at,
    })
}

/// Decode the `assignments` collection into study items.
pub fn parse_assignments(data: Value) -> Result<Vec<StudyItem>, SyncError> {
    let records: Vec<AssignmentRecord> = decode("assignments", data)?;
    Ok(records
        .into_iter()
        .map(|r| StudyItem {
            available_at: r.data.available_at.map(|t| t.timestamp()),
            burned: r.data.burned_at.is_some(),
        })
        .collect())
}
