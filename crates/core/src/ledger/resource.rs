//! Per-user resource quantity ledger.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use starledger_shared::types::{ResourceId, UpdateMode, UserId};
use tracing::{info, warn};

use super::DEFAULT_MAX_ATTEMPTS;
use super::error::LedgerError;
use super::mode::{Rejection, apply_quantity};
use crate::clock::Clock;
use crate::history::{DateRange, HistorySnapshotter, PendingSnapshots, SnapshotValue, SubjectKey};
use crate::records::{Holding, QuantitySnapshot};
use crate::store::{CatalogStore, HistoryStore, LedgerStore};

/// Result of an accepted quantity update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityUpdate {
    /// Holder.
    pub user_id: UserId,
    /// Resource.
    pub resource_id: ResourceId,
    /// Quantity after the update.
    pub quantity: f64,
    /// Day the snapshot was filed under.
    pub day: NaiveDate,
    /// Whether today's history row was written.
    pub snapshot_recorded: bool,
}

/// Applies quantity updates and keeps the daily quantity history.
pub struct ResourceLedger<S> {
    store: Arc<S>,
    snapshotter: HistorySnapshotter<S>,
    pending: PendingSnapshots,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl<S: LedgerStore + HistoryStore + CatalogStore> ResourceLedger<S> {
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

    /// Applies `quantity` to the holding of `resource_id` by `user_id` under `mode`.
    ///
    /// The holding must already exist; see [`Self::attach`].
    ///
    /// # Errors
    ///
    /// - `HoldingNotFound` if the user does not hold the resource
    /// - `InsufficientQuantity`, `NegativeAmount` or `InvalidQuantity` if the update is refused
    /// - `ConcurrentModification` if every compare-and-swap attempt lost
    pub async fn apply(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        quantity: f64,
        mode: UpdateMode,
    ) -> Result<QuantityUpdate, LedgerError> {
        let next = self.commit(user_id, resource_id, quantity, mode).await?;
        let day = self.clock.today();
        let subject = SubjectKey::Quantity(user_id, resource_id);

        let snapshot_recorded = match self
            .snapshotter
            .snapshot(subject, day, SnapshotValue::Quantity(next))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    resource_id = %resource_id,
                    %day,
                    error = %e,
                    "Quantity committed but snapshot failed, queued for reconciliation"
                );
                self.pending.record(subject, day);
                false
            }
        };

        info!(
            user_id = %user_id,
            resource_id = %resource_id,
            %mode,
            quantity = next,
            "Resource quantity updated"
        );

        Ok(QuantityUpdate {
            user_id,
            resource_id,
            quantity: next,
            day,
            snapshot_recorded,
        })
    }

    async fn commit(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        quantity: f64,
        mode: UpdateMode,
    ) -> Result<f64, LedgerError> {
        for _ in 0..self.max_attempts {
            let holding = self
                .store
                .find_holding(user_id, resource_id)
                .await?
                .ok_or(LedgerError::HoldingNotFound {
                    user_id,
                    resource_id,
                })?;

            let next = apply_quantity(holding.quantity, quantity, mode).map_err(|rejection| {
                match rejection {
                    Rejection::NegativeAmount => LedgerError::NegativeAmount,
                    Rejection::BelowZero => LedgerError::InsufficientQuantity {
                        resource_id,
                        available: holding.quantity,
                        requested: quantity,
                    },
                    Rejection::Overflow | Rejection::NotFinite => LedgerError::InvalidQuantity,
                }
            })?;

            if self
                .store
                .compare_and_set_quantity(user_id, resource_id, holding.version, next)
                .await?
            {
                return Ok(next);
            }
        }

        Err(LedgerError::ConcurrentModification {
            subject: SubjectKey::Quantity(user_id, resource_id).to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Gives `user_id` an empty holding of `resource_id`. Existing holdings are returned unchanged.
    pub async fn attach(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<Holding, LedgerError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound(user_id));
        }
        if self.store.find_resource(resource_id).await?.is_none() {
            return Err(LedgerError::ResourceNotFound(resource_id));
        }
        let holding = self.store.attach_holding(user_id, resource_id).await?;
        info!(user_id = %user_id, resource_id = %resource_id, "Resource attached");
        Ok(holding)
    }

    /// One holding.
    pub async fn holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<Holding, LedgerError> {
        self.store
            .find_holding(user_id, resource_id)
            .await?
            .ok_or(LedgerError::HoldingNotFound {
                user_id,
                resource_id,
            })
    }

    /// Every holding of `user_id`.
    pub async fn holdings(&self, user_id: UserId) -> Result<Vec<Holding>, LedgerError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound(user_id));
        }
        Ok(self.store.list_holdings(user_id).await?)
    }

    /// Daily quantity rows of `user_id` within `range`, oldest first.
    pub async fn history(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<Vec<QuantitySnapshot>, LedgerError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound(user_id));
        }
        Ok(self.store.quantity_history(&[user_id], range).await?)
    }
}
