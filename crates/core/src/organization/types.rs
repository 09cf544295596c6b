//! Rollup rows returned by the aggregator.

use chrono::NaiveDate;
use serde::Serialize;
use starledger_shared::types::{OrganizationId, ResourceId, UserId};

use crate::records::{Organization, UserAccount};

/// An organization with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetails {
    /// The organization.
    #[serde(flatten)]
    pub organization: Organization,
    /// Members ordered by email.
    pub members: Vec<UserAccount>,
}

/// Sum of member balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationBalance {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Sum of member balances.
    pub balance: i64,
}

/// One member's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBalance {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Member.
    pub user_id: UserId,
    /// Member display name.
    pub user_name: String,
    /// Member balance.
    pub balance: i64,
}

/// Summed member balances for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBalance {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Day.
    #[serde(rename = "timestamp")]
    pub day: NaiveDate,
    /// Sum of member snapshots that day.
    pub balance: i64,
}

/// Summed quantity of one resource across members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTotal {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Resource.
    pub resource_id: ResourceId,
    /// Summed quantity.
    pub quantity: f64,
}

/// One member's quantity of one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResource {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Member.
    pub user_id: UserId,
    /// Member display name.
    pub user_name: String,
    /// Resource.
    pub resource_id: ResourceId,
    /// Quantity held.
    pub quantity: f64,
}

/// Summed quantity of one resource for one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyResourceTotal {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Resource.
    pub resource_id: ResourceId,
    /// Day.
    #[serde(rename = "timestamp")]
    pub day: NaiveDate,
    /// Sum of member snapshots that day.
    pub quantity: f64,
}
