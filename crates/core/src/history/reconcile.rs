//! Rebuilding history rows whose write failed.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashSet;
use tracing::{info, warn};

use super::{DateRange, HistorySnapshotter, Snapshot, SnapshotValue, SubjectKey};
use crate::store::{HistoryStore, LedgerStore, StoreResult};

/// `(subject, day)` pairs whose snapshot write failed after the ledger write succeeded.
#[derive(Debug, Clone, Default)]
pub struct PendingSnapshots {
    inner: Arc<DashSet<(SubjectKey, NaiveDate)>>,
}

impl PendingSnapshots {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a pair for reconciliation.
    pub fn record(&self, subject: SubjectKey, day: NaiveDate) {
        self.inner.insert((subject, day));
    }

    /// Whether a pair is queued.
    #[must_use]
    pub fn contains(&self, subject: SubjectKey, day: NaiveDate) -> bool {
        self.inner.contains(&(subject, day))
    }

    /// Number of queued pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn take(&self) -> Vec<(SubjectKey, NaiveDate)> {
        let queued: Vec<_> = self.inner.iter().map(|entry| *entry.key()).collect();
        for pair in &queued {
            self.inner.remove(pair);
        }
        queued
    }
}

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rows rewritten from live values.
    pub reconciled: usize,
    /// Subjects that no longer exist, or that already have a row for a later day.
    pub skipped: usize,
    /// Pairs that failed again and were re-queued.
    pub failed: usize,
}

/// Drains [`PendingSnapshots`] by snapshotting each subject's live value.
#[derive(Debug)]
pub struct HistoryReconciler<S> {
    store: Arc<S>,
    snapshotter: HistorySnapshotter<S>,
    pending: PendingSnapshots,
}

impl<S: LedgerStore + HistoryStore> HistoryReconciler<S> {
    /// Creates a reconciler draining `pending`.
    pub fn new(store: Arc<S>, pending: PendingSnapshots) -> Self {
        Self {
            snapshotter: HistorySnapshotter::new(Arc::clone(&store)),
            store,
            pending,
        }
    }

    /// Re-reads the live value of `subject` and snapshots it for `day`.
    ///
    /// The live value is only known to match `day` while no later day has a
    /// row. Once one exists the pair is dropped rather than stamping `day` with
    /// a value written afterwards.
    ///
    /// Returns `None` when the subject no longer exists or `day` is superseded.
    pub async fn reconcile(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
    ) -> StoreResult<Option<Snapshot>> {
        if self.superseded(subject, day).await? {
            info!(%subject, %day, "Skipping reconciliation, a later day is recorded");
            return Ok(None);
        }

        let value = match subject {
            SubjectKey::Balance(user_id) => self
                .store
                .find_user(user_id)
                .await?
                .map(|user| SnapshotValue::Balance(user.balance)),
            SubjectKey::Quantity(user_id, resource_id) => self
                .store
                .find_holding(user_id, resource_id)
                .await?
                .map(|holding| SnapshotValue::Quantity(holding.quantity)),
        };

        match value {
            Some(value) => Ok(Some(self.snapshotter.snapshot(subject, day, value).await?)),
            None => Ok(None),
        }
    }

    /// Whether `subject` has a history row for any day after `day`.
    async fn superseded(&self, subject: SubjectKey, day: NaiveDate) -> StoreResult<bool> {
        let Some(next) = day.succ_opt() else {
            return Ok(false);
        };
        let later = DateRange::new(Some(next), None).unwrap_or_else(|_| DateRange::all());
        let user_ids = [subject.user_id()];
        Ok(match subject {
            SubjectKey::Balance(_) => !self
                .store
                .balance_history(&user_ids, later)
                .await?
                .is_empty(),
            SubjectKey::Quantity(_, resource_id) => self
                .store
                .quantity_history(&user_ids, later)
                .await?
                .iter()
                .any(|row| row.resource_id == resource_id),
        })
    }

    /// Reconciles every queued pair once. Pairs that fail again are re-queued.
    pub async fn run_once(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (subject, day) in self.pending.take() {
            match self.reconcile(subject, day).await {
                Ok(Some(_)) => report.reconciled += 1,
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(%subject, %day, error = %e, "History reconciliation failed");
                    self.pending.record(subject, day);
                    report.failed += 1;
                }
            }
        }

        if report != ReconcileReport::default() {
            info!(
                reconciled = report.reconciled,
                skipped = report.skipped,
                failed = report.failed,
                "History reconciliation sweep finished"
            );
        }
        report
    }
}
