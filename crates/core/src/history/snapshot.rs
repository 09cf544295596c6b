//! Same-day snapshot upsert.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use super::{Snapshot, SnapshotValue, SubjectKey};
use crate::store::{HistoryStore, StoreError, StoreResult};

/// Writes at most one history row per subject and day.
#[derive(Debug)]
pub struct HistorySnapshotter<S> {
    store: Arc<S>,
}

impl<S> Clone for HistorySnapshotter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: HistoryStore> HistorySnapshotter<S> {
    /// Creates a snapshotter over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Records `value` as the snapshot of `subject` for `day`.
    ///
    /// Inserts when the day has no row yet, otherwise overwrites the existing
    /// row. An insert that loses a race to a concurrent insert falls back to
    /// overwriting the winner's row.
    pub async fn snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot> {
        if let Some(existing) = self.store.find_snapshot(subject, day).await? {
            return self.store.update_snapshot(subject, existing.id, value).await;
        }

        match self.store.insert_snapshot(subject, day, value).await {
            Err(StoreError::Conflict(_)) => {
                debug!(%subject, %day, "Snapshot insert raced, overwriting");
                let existing = self.store.find_snapshot(subject, day).await?.ok_or_else(|| {
                    StoreError::Backend(format!("snapshot of {subject} for {day} vanished"))
                })?;
                self.store.update_snapshot(subject, existing.id, value).await
            }
            other => other,
        }
    }
}
