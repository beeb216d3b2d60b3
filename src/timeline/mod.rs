//! Timeline pins and reconciliation against previously published pins.

pub mod known;
pub mod pin;
pub mod reconcile;

pub use known::{KnownEntryId, KnownEntrySet, KNOWN_PINS_RECORD, PIN_REVISIONS_RECORD};
pub use pin::{Pin, PinAction, PinBuilder, PinLayout, Reminder};
pub use reconcile::{
    PinCreate, ReconcilePlan, Reconciler, TimelineDriver, TimelineOp, DEFAULT_RETENTION_BUCKETS,
};
