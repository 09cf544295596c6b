//! Read-only organization rollups.
//!
//! Every rollup first resolves the organization, so an unknown id is
//! `NotFound` while an organization without members or history yields an
//! empty (or zero) result.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use starledger_shared::types::{OrganizationId, ResourceId, UserId};
use tracing::debug;

use super::error::OrganizationError;
use super::types::{
    DailyBalance, DailyResourceTotal, MemberBalance, MemberResource, OrganizationBalance,
    ResourceTotal,
};
use crate::history::DateRange;
use crate::records::UserAccount;
use crate::store::{HistoryStore, LedgerStore, OrganizationStore};

/// Rolls up ledger state across an organization's members.
pub struct OrganizationAggregator<S> {
    store: Arc<S>,
}

impl<S: OrganizationStore + LedgerStore + HistoryStore> OrganizationAggregator<S> {
    /// Creates an aggregator over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn members(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<UserAccount>, OrganizationError> {
        if self
            .store
            .find_organization(organization_id)
            .await?
            .is_none()
        {
            return Err(OrganizationError::NotFound(organization_id));
        }
        let members = self.store.members(organization_id).await?;
        debug!(organization_id = %organization_id, members = members.len(), "Loaded members");
        Ok(members)
    }

    fn ids(members: &[UserAccount]) -> Vec<UserId> {
        members.iter().map(|member| member.id).collect()
    }

    /// Sum of member balances.
    pub async fn total_balance(
        &self,
        organization_id: OrganizationId,
    ) -> Result<OrganizationBalance, OrganizationError> {
        let members = self.members(organization_id).await?;
        let balance = members
            .iter()
            .fold(0i64, |sum, member| sum.saturating_add(member.balance));
        Ok(OrganizationBalance {
            organization_id,
            balance,
        })
    }

    /// Balance of each member, ordered by email.
    pub async fn balance_by_user(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<MemberBalance>, OrganizationError> {
        let members = self.members(organization_id).await?;
        Ok(members
            .into_iter()
            .map(|member| MemberBalance {
                organization_id,
                user_id: member.id,
                user_name: member.display_name().to_string(),
                balance: member.balance,
            })
            .collect())
    }

    /// Member balance snapshots within `range`, summed per day.
    pub async fn balance_history(
        &self,
        organization_id: OrganizationId,
        range: DateRange,
    ) -> Result<Vec<DailyBalance>, OrganizationError> {
        let members = self.members(organization_id).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .balance_history(&Self::ids(&members), range)
            .await?;

        let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for row in rows {
            let sum = by_day.entry(row.day).or_default();
            *sum = sum.saturating_add(row.balance);
        }
        Ok(by_day
            .into_iter()
            .map(|(day, balance)| DailyBalance {
                organization_id,
                day,
                balance,
            })
            .collect())
    }

    /// Each member's holdings, ordered by member email then resource.
    pub async fn resources_by_user(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<MemberResource>, OrganizationError> {
        let members = self.members(organization_id).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }
        let names: HashMap<UserId, &str> = members
            .iter()
            .map(|member| (member.id, member.display_name()))
            .collect();
        let mut holdings = self.store.holdings_of(&Self::ids(&members)).await?;
        let order: HashMap<UserId, usize> = members
            .iter()
            .enumerate()
            .map(|(index, member)| (member.id, index))
            .collect();
        holdings.sort_by_key(|holding| (order.get(&holding.user_id).copied(), holding.resource_id));

        Ok(holdings
            .into_iter()
            .map(|holding| MemberResource {
                organization_id,
                user_id: holding.user_id,
                user_name: names
                    .get(&holding.user_id)
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                resource_id: holding.resource_id,
                quantity: holding.quantity,
            })
            .collect())
    }

    /// Member holdings summed per resource.
    pub async fn resources(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<ResourceTotal>, OrganizationError> {
        let members = self.members(organization_id).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }
        let holdings = self.store.holdings_of(&Self::ids(&members)).await?;

        let mut totals: BTreeMap<ResourceId, f64> = BTreeMap::new();
        for holding in holdings {
            *totals.entry(holding.resource_id).or_default() += holding.quantity;
        }
        Ok(totals
            .into_iter()
            .map(|(resource_id, quantity)| ResourceTotal {
                organization_id,
                resource_id,
                quantity,
            })
            .collect())
    }

    /// Member quantity snapshots within `range`, summed per day and resource.
    pub async fn resource_history(
        &self,
        organization_id: OrganizationId,
        range: DateRange,
    ) -> Result<Vec<DailyResourceTotal>, OrganizationError> {
        let members = self.members(organization_id).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .quantity_history(&Self::ids(&members), range)
            .await?;

        let mut totals: BTreeMap<(NaiveDate, ResourceId), f64> = BTreeMap::new();
        for row in rows {
            *totals.entry((row.day, row.resource_id)).or_default() += row.quantity;
        }
        Ok(totals
            .into_iter()
            .map(|((day, resource_id), quantity)| DailyResourceTotal {
                organization_id,
                resource_id,
                day,
                quantity,
            })
            .collect())
    }
}
