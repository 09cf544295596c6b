//! Daily watermark history.
//!
//! Every accepted ledger mutation snapshots the subject's new value under the
//! current UTC day. Later updates on the same day overwrite that row, so a day
//! holds the last value written during it.
//!
//! When a snapshot write fails after the ledger write succeeded, the
//! `(subject, day)` pair lands in [`PendingSnapshots`] and the
//! [`HistoryReconciler`] later rebuilds the row from the live value.

pub mod range;
pub mod reconcile;
pub mod snapshot;

#[cfg(test)]
mod tests;

use chrono::NaiveDate;
use starledger_shared::types::{ResourceId, UserId};

pub use range::{DateRange, InvalidDateRange};
pub use reconcile::{HistoryReconciler, PendingSnapshots, ReconcileReport};
pub use snapshot::HistorySnapshotter;

/// What a history row tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectKey {
    /// A user's balance.
    Balance(UserId),
    /// A user's quantity of one resource.
    Quantity(UserId, ResourceId),
}

impl SubjectKey {
    /// User the subject belongs to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::Balance(user_id) | Self::Quantity(user_id, _) => *user_id,
        }
    }
}

impl std::fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Balance(user_id) => write!(f, "balance of user {user_id}"),
            Self::Quantity(user_id, resource_id) => {
                write!(f, "resource {resource_id} of user {user_id}")
            }
        }
    }
}

/// Snapshotted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotValue {
    /// Balance.
    Balance(i64),
    /// Resource quantity.
    Quantity(f64),
}

/// One history row.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Row id.
    pub id: i64,
    /// Tracked subject.
    pub subject: SubjectKey,
    /// UTC day.
    pub day: NaiveDate,
    /// Value as of the last write that day.
    pub value: SnapshotValue,
}
