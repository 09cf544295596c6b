//! Persistent records shared by the store traits and the domain services.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use starledger_shared::types::{OrganizationId, ResourceId, UserId};

/// A user account as held by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Identity key issued by the identity provider.
    pub id: UserId,
    /// Unique email address.
    pub email: String,
    /// Optional display name.
    pub handle: Option<String>,
    /// Monetary balance, never negative.
    pub balance: i64,
    /// Organization the user belongs to, if any.
    pub organization_id: Option<OrganizationId>,
    /// Owner of `organization_id`.
    pub is_owner: bool,
    /// Admin of `organization_id`.
    pub is_admin: bool,
    /// Compare-and-swap counter, bumped on every balance write.
    #[serde(skip)]
    pub version: i64,
}

impl UserAccount {
    /// Name shown in organization rollups: the handle when set, else the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.handle.as_deref().unwrap_or(&self.email)
    }

    /// Whether the user is linked to `organization_id`.
    #[must_use]
    pub fn belongs_to(&self, organization_id: OrganizationId) -> bool {
        self.organization_id == Some(organization_id)
    }
}

/// Fields needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Identity key.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// Optional display name.
    pub handle: Option<String>,
}

/// Organization link and flags of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Membership {
    /// Linked organization.
    pub organization_id: Option<OrganizationId>,
    /// Owner flag.
    pub is_owner: bool,
    /// Admin flag.
    pub is_admin: bool,
}

impl Membership {
    /// Unaffiliated user with no flags.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            organization_id: None,
            is_owner: false,
            is_admin: false,
        }
    }

    /// Founder of `organization_id`: owner and admin.
    #[must_use]
    pub const fn founder(organization_id: OrganizationId) -> Self {
        Self {
            organization_id: Some(organization_id),
            is_owner: true,
            is_admin: true,
        }
    }
}

impl From<&UserAccount> for Membership {
    fn from(user: &UserAccount) -> Self {
        Self {
            organization_id: user.organization_id,
            is_owner: user.is_owner,
            is_admin: user.is_admin,
        }
    }
}

/// An organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Organization id.
    pub id: OrganizationId,
    /// Display name, 3 to 100 characters.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A user's quantity of one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Holder.
    pub user_id: UserId,
    /// Held resource.
    pub resource_id: ResourceId,
    /// Quantity, never negative.
    pub quantity: f64,
    /// Compare-and-swap counter.
    #[serde(skip)]
    pub version: i64,
}

/// Global catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Database-assigned id.
    pub id: ResourceId,
    /// Natural key, 1 to 4 characters.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-form category.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Buy price.
    pub price_buy: f64,
    /// Sell price.
    pub price_sell: f64,
    /// Last upsert time.
    pub last_updated: DateTime<Utc>,
}

/// Validated catalog fields written by an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFields {
    /// Natural key.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub resource_type: String,
    /// Buy price.
    pub price_buy: f64,
    /// Sell price.
    pub price_sell: f64,
}

/// Daily balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    /// Row id.
    pub id: i64,
    /// Subject user.
    pub user_id: UserId,
    /// UTC calendar day.
    #[serde(rename = "timestamp")]
    pub day: NaiveDate,
    /// Balance as of the last update that day.
    pub balance: i64,
}

/// Daily quantity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitySnapshot {
    /// Row id.
    pub id: i64,
    /// Subject user.
    pub user_id: UserId,
    /// Subject resource.
    pub resource_id: ResourceId,
    /// UTC calendar day.
    #[serde(rename = "timestamp")]
    pub day: NaiveDate,
    /// Quantity as of the last update that day.
    pub quantity: f64,
}

/// A (type, value) claim granted to a user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Claim type, e.g. `Organization`.
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Claim value.
    pub value: String,
}

impl Claim {
    /// Creates a claim.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}
