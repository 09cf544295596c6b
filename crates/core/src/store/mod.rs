//! Storage seams.
//!
//! The domain services only talk to storage through these traits. `starledger-db`
//! implements them on SeaORM; [`MemoryStore`] implements them in process.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use starledger_shared::types::{OrganizationId, ResourceId, UserId};
use starledger_shared::{AppError, FieldErrors};
use thiserror::Error;

use crate::history::{DateRange, Snapshot, SnapshotValue, SubjectKey};
use crate::records::{
    BalanceSnapshot, Claim, Holding, Membership, NewUser, Organization, QuantitySnapshot,
    Resource, ResourceFields, UserAccount,
};

pub use memory::MemoryStore;

/// Result alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store refused a write, e.g. granting a role that does not exist.
    #[error("{code}: {description}")]
    Rejected {
        /// Machine-readable reason.
        code: String,
        /// Human-readable reason.
        description: String,
    },

    /// Backend failure.
    #[error("Storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Builds a rejection.
    pub fn rejected(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            description: description.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Rejected { code, description } => {
                let mut errors = FieldErrors::new();
                errors.insert(code, vec![description]);
                Self::ValidationFailed(errors)
            }
            StoreError::Backend(msg) => Self::Database(msg),
        }
    }
}

/// Balance and holding rows.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Loads a user.
    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<UserAccount>>;

    /// Writes `balance` if the stored version still equals `expected_version`.
    ///
    /// Returns `false` when the version moved or the user vanished.
    async fn compare_and_set_balance(
        &self,
        user_id: UserId,
        expected_version: i64,
        balance: i64,
    ) -> StoreResult<bool>;

    /// Loads one holding.
    async fn find_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Option<Holding>>;

    /// All holdings of a user, ordered by resource id.
    async fn list_holdings(&self, user_id: UserId) -> StoreResult<Vec<Holding>>;

    /// All holdings of the given users.
    async fn holdings_of(&self, user_ids: &[UserId]) -> StoreResult<Vec<Holding>>;

    /// Creates an empty holding, or returns the existing one.
    async fn attach_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Holding>;

    /// Writes `quantity` if the stored version still equals `expected_version`.
    async fn compare_and_set_quantity(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        expected_version: i64,
        quantity: f64,
    ) -> StoreResult<bool>;
}

/// Daily history rows.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Row for exactly `(subject, day)`.
    async fn find_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
    ) -> StoreResult<Option<Snapshot>>;

    /// Inserts a row; [`StoreError::Conflict`] if `(subject, day)` already exists.
    async fn insert_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot>;

    /// Overwrites the value of row `id`.
    async fn update_snapshot(
        &self,
        subject: SubjectKey,
        id: i64,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot>;

    /// Balance rows of the given users within `range`, ordered by day.
    async fn balance_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<BalanceSnapshot>>;

    /// Quantity rows of the given users within `range`, ordered by day.
    async fn quantity_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<QuantitySnapshot>>;
}

/// User profiles.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users, ordered by email.
    async fn list_users(&self) -> StoreResult<Vec<UserAccount>>;

    /// Inserts a user with zero balance; [`StoreError::Conflict`] on duplicate id or email.
    async fn create_user(&self, user: NewUser) -> StoreResult<UserAccount>;

    /// Updates the given profile fields. `None` when the user does not exist.
    async fn update_profile(
        &self,
        user_id: UserId,
        email: Option<String>,
        handle: Option<String>,
    ) -> StoreResult<Option<UserAccount>>;

    /// Deletes a user with their holdings, history and grants.
    async fn delete_user(&self, user_id: UserId) -> StoreResult<bool>;
}

/// Organizations and membership links.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Loads an organization.
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Option<Organization>>;

    /// All organizations, ordered by name.
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>>;

    /// Atomically inserts `organization` and makes `founder` its owner and admin,
    /// granting the `Organization` claim and the `Owner` and `Admin` roles.
    async fn create_organization(
        &self,
        organization: &Organization,
        founder: UserId,
    ) -> StoreResult<()>;

    /// Members of an organization, ordered by email.
    async fn members(&self, organization_id: OrganizationId) -> StoreResult<Vec<UserAccount>>;

    /// Replaces a user's organization link and flags. `false` if the user does not exist.
    async fn set_membership(&self, user_id: UserId, membership: Membership) -> StoreResult<bool>;

    /// Deletes an organization, unlinking its members. `false` if it did not exist.
    async fn delete_organization(&self, organization_id: OrganizationId) -> StoreResult<bool>;
}

/// Global resource catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Full catalog ordered by id.
    async fn list_resources(&self) -> StoreResult<Vec<Resource>>;

    /// Loads a resource by id.
    async fn find_resource(&self, resource_id: ResourceId) -> StoreResult<Option<Resource>>;

    /// Loads a resource by natural key.
    async fn find_resource_by_code(&self, code: &str) -> StoreResult<Option<Resource>>;

    /// Inserts a new catalog row.
    async fn insert_resource(
        &self,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource>;

    /// Overwrites an existing catalog row.
    async fn update_resource(
        &self,
        resource_id: ResourceId,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource>;
}

/// Roles and claims.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Whether a role exists.
    async fn role_exists(&self, name: &str) -> StoreResult<bool>;

    /// Creates a role.
    async fn create_role(&self, name: &str) -> StoreResult<()>;

    /// Role names granted to a user.
    async fn roles_of(&self, user_id: UserId) -> StoreResult<Vec<String>>;

    /// Grants a role; [`StoreError::Rejected`] if the role does not exist.
    async fn add_role(&self, user_id: UserId, role: &str) -> StoreResult<()>;

    /// Revokes a role. Revoking an ungranted role is a no-op.
    async fn remove_role(&self, user_id: UserId, role: &str) -> StoreResult<()>;

    /// Claims granted to a user.
    async fn claims_of(&self, user_id: UserId) -> StoreResult<Vec<Claim>>;

    /// Grants a claim. Granting an identical claim twice is a no-op.
    async fn add_claim(&self, user_id: UserId, claim: &Claim) -> StoreResult<()>;

    /// Revokes one claim.
    async fn remove_claim(&self, user_id: UserId, claim: &Claim) -> StoreResult<()>;
}

/// Every store capability, as needed by the HTTP layer.
pub trait Store:
    LedgerStore + HistoryStore + UserStore + OrganizationStore + CatalogStore + IdentityStore
{
}

impl<T> Store for T where
    T: LedgerStore + HistoryStore + UserStore + OrganizationStore + CatalogStore + IdentityStore
{
}
