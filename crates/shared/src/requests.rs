//! Request payloads accepted by the HTTP layer.
//!
//! Field names follow the camelCase wire format used by existing clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{ResourceId, UpdateMode, UserId};

/// Apply a balance update to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBalanceRequest {
    /// Amount to add, subtract, or set.
    pub update_amount: i64,
    /// How the amount is applied.
    pub update_type: UpdateMode,
}

/// Apply a quantity update to one of a user's resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserResourceRequest {
    /// Catalog resource being adjusted.
    pub resource_id: ResourceId,
    /// Quantity to add, subtract, or set.
    pub quantity: f64,
    /// How the quantity is applied.
    pub update_type: UpdateMode,
}

/// Create an organization.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    /// Founding user; defaults to the caller.
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Organization name.
    #[validate(length(
        min = 3,
        max = 100,
        message = "Organization name must be between 3 and 100 characters"
    ))]
    pub organization_name: String,
}

/// Target user for add-member and promote-admin operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    /// The user being added or promoted.
    pub user_id: UserId,
}

/// Register the caller's user profile.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    /// Contact email.
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    /// Optional display handle.
    #[validate(length(min = 1, max = 64, message = "Handle must be between 1 and 64 characters"))]
    pub handle: Option<String>,
}

/// Update a user profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// New contact email.
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    /// New display handle.
    #[validate(length(min = 1, max = 64, message = "Handle must be between 1 and 64 characters"))]
    pub handle: Option<String>,
}

/// One catalog entry in a resource upsert batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResourceRequest {
    /// Display name.
    pub name: String,
    /// Natural key, at most 4 characters.
    pub code: String,
    /// Category label.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Purchase price.
    pub price_buy: f64,
    /// Sale price.
    pub price_sell: f64,
}

/// Optional inclusive date bounds for history queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// First day included.
    pub start_date: Option<NaiveDate>,
    /// Last day included.
    pub end_date: Option<NaiveDate>,
}
