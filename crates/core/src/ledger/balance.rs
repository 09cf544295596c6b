//! Per-user balance ledger.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use starledger_shared::types::{UpdateMode, UserId};
use tracing::{info, warn};

use super::DEFAULT_MAX_ATTEMPTS;
use super::error::LedgerError;
use super::mode::{Rejection, apply_balance};
use crate::clock::Clock;
use crate::history::{DateRange, HistorySnapshotter, PendingSnapshots, SnapshotValue, SubjectKey};
use crate::records::BalanceSnapshot;
use crate::store::{HistoryStore, LedgerStore};

/// Result of an accepted balance update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    /// Subject.
    pub user_id: UserId,
    /// Balance after the update.
    pub balance: i64,
    /// Day the snapshot was filed under.
    pub day: NaiveDate,
    /// Whether today's history row was written. When `false` the row is
    /// queued for reconciliation.
    pub snapshot_recorded: bool,
}

/// Applies balance updates and keeps the daily balance history.
pub struct BalanceLedger<S> {
    store: Arc<S>,
    snapshotter: HistorySnapshotter<S>,
    pending: PendingSnapshots,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl<S: LedgerStore + HistoryStore> BalanceLedger<S> {
    /// Creates a ledger over `store`, queueing failed snapshots into `pending`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, pending: PendingSnapshots) -> Self {
        Self {
            snapshotter: HistorySnapshotter::new(Arc::clone(&store)),
            store,
            pending,
            clock,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides how many compare-and-swap attempts an update makes.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Applies `amount` to the balance of `user_id` under `mode`.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user does not exist
    /// - `NegativeBalance`, `NegativeAmount` or `Overflow` if the update is refused
    /// - `ConcurrentModification` if every compare-and-swap attempt lost
    pub async fn apply(
        &self,
        user_id: UserId,
        amount: i64,
        mode: UpdateMode,
    ) -> Result<BalanceUpdate, LedgerError> {
        let balance = self.commit(user_id, amount, mode).await?;
        let day = self.clock.today();
        let subject = SubjectKey::Balance(user_id);

        let snapshot_recorded = match self
            .snapshotter
            .snapshot(subject, day, SnapshotValue::Balance(balance))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    %day,
                    error = %e,
                    "Balance committed but snapshot failed, queued for reconciliation"
                );
                self.pending.record(subject, day);
                false
            }
        };

        info!(user_id = %user_id, %mode, amount, balance, "Balance updated");

        Ok(BalanceUpdate {
            user_id,
            balance,
            day,
            snapshot_recorded,
        })
    }

    async fn commit(&self, user_id: UserId, amount: i64, mode: UpdateMode) -> Result<i64, LedgerError> {
        for _ in 0..self.max_attempts {
            let user = self
                .store
                .find_user(user_id)
                .await?
                .ok_or(LedgerError::UserNotFound(user_id))?;

            let next = apply_balance(user.balance, amount, mode).map_err(|rejection| match rejection {
                Rejection::NegativeAmount => LedgerError::NegativeAmount,
                Rejection::BelowZero => LedgerError::NegativeBalance {
                    user_id,
                    balance: user.balance,
                    requested: amount,
                },
                Rejection::Overflow | Rejection::NotFinite => LedgerError::Overflow,
            })?;

            if self
                .store
                .compare_and_set_balance(user_id, user.version, next)
                .await?
            {
                return Ok(next);
            }
        }

        Err(LedgerError::ConcurrentModification {
            subject: SubjectKey::Balance(user_id).to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Current balance of `user_id`.
    pub async fn balance(&self, user_id: UserId) -> Result<i64, LedgerError> {
        self.store
            .find_user(user_id)
            .await?
            .map(|user| user.balance)
            .ok_or(LedgerError::UserNotFound(user_id))
    }

    /// Daily balance rows of `user_id` within `range`, oldest first.
    pub async fn history(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<Vec<BalanceSnapshot>, LedgerError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound(user_id));
        }
        Ok(self.store.balance_history(&[user_id], range).await?)
    }
}
