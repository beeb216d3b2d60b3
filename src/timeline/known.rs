//! Record of pins published in earlier runs.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::store::{load_object, save_object};
use crate::core::{BlobStore, SyncError};

/// Record holding the ordered list of known buckets.
pub const KNOWN_PINS_RECORD: &str = "timeline_pins";
/// Record holding the per-bucket pin revisions.
pub const PIN_REVISIONS_RECORD: &str = "timeline_pin_revisions";

/// Identifier of one published pin: `identity@bucket`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KnownEntryId {
    identity: String,
    bucket: i64,
}

impl KnownEntryId {
    /// Id for `bucket` under `identity`.
    pub fn new(identity: impl Into<String>, bucket: i64) -> Self {
        Self {
            identity: identity.into(),
            bucket,
        }
    }

    /// Split an `identity@bucket` string. The identity may itself contain `@`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (identity, bucket) = raw.rsplit_once('@')?;
        Some(Self::new(identity, bucket.parse().ok()?))
    }

    /// Owning identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Time bucket.
    pub const fn bucket(&self) -> i64 {
        self.bucket
    }
}

impl fmt::Display for KnownEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identity, self.bucket)
    }
}

/// Buckets with a published pin, plus the revision last sent for each.
///
/// Identities are not stored; ids are rebuilt with the run's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownEntrySet {
    entries: BTreeMap<i64, Option<String>>,
}

impl KnownEntrySet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set of buckets with unknown revisions.
    pub fn from_buckets(buckets: impl IntoIterator<Item = i64>) -> Self {
        Self {
            entries: buckets.into_iter().map(|b| (b, None)).collect(),
        }
    }

    /// Record a published pin. Returns `false` if the bucket was already known.
    pub fn insert(&mut self, bucket: i64, revision: Option<String>) -> bool {
        self.entries.insert(bucket, revision).is_none()
    }

    /// Forget a bucket. Returns whether it was known.
    pub fn remove(&mut self, bucket: i64) -> bool {
        self.entries.remove(&bucket).is_some()
    }

    /// Whether `bucket` is known.
    pub fn contains(&self, bucket: i64) -> bool {
        self.entries.contains_key(&bucket)
    }

    /// Revision last published for `bucket`.
    pub fn revision(&self, bucket: i64) -> Option<&str> {
        self.entries.get(&bucket).and_then(|r| r.as_deref())
    }

    /// Known buckets, ascending.
    pub fn buckets(&self) -> Vec<i64> {
        self.entries.keys().copied().collect()
    }

    /// Known buckets strictly below `bucket`.
    pub fn buckets_before(&self, bucket: i64) -> Vec<i64> {
        self.entries.range(..bucket).map(|(b, _)| *b).collect()
    }

    /// Drop every bucket strictly below `bucket`, returning them.
    pub fn prune_before(&mut self, bucket: i64) -> Vec<i64> {
        let kept = self.entries.split_off(&bucket);
        let pruned = std::mem::replace(&mut self.entries, kept);
        pruned.into_keys().collect()
    }

    /// Number of known buckets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load both records. Missing or corrupt records read as empty; a
    /// revision without a matching bucket is ignored.
    pub fn load<S: BlobStore + ?Sized>(store: &S) -> Self {
        let buckets: Vec<i64> = load_object(store, KNOWN_PINS_RECORD, Vec::new());
        let mut revisions: BTreeMap<i64, String> =
            load_object(store, PIN_REVISIONS_RECORD, BTreeMap::new());
        Self {
            entries: buckets
                .into_iter()
                .map(|b| (b, revisions.remove(&b)))
                .collect(),
        }
    }

    /// Persist both records.
    pub fn save<S: BlobStore + ?Sized>(&self, store: &S) -> Result<(), SyncError> {
        let revisions: BTreeMap<i64, &str> = self
            .entries
            .iter()
            .filter_map(|(b, r)| r.as_deref().map(|r| (*b, r)))
            .collect();
        save_object(store, KNOWN_PINS_RECORD, &self.buckets())?;
        save_object(store, PIN_REVISIONS_RECORD, &revisions)
    }
}
