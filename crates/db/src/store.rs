//! SeaORM implementation of the core store traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use starledger_core::auth::{ADMIN_ROLE, ORGANIZATION_CLAIM, OWNER_ROLE};
use starledger_core::history::{DateRange, Snapshot, SnapshotValue, SubjectKey};
use starledger_core::records::{
    BalanceSnapshot, Claim, Holding, Membership, NewUser, Organization, QuantitySnapshot,
    Resource, ResourceFields, UserAccount,
};
use starledger_core::store::{
    CatalogStore, HistoryStore, IdentityStore, LedgerStore, OrganizationStore, UserStore,
};
use starledger_core::{StoreError, StoreResult};
use starledger_shared::types::{OrganizationId, ResourceId, UserId};
use uuid::Uuid;

use crate::entities::{
    balance_history, organizations, resource_quantity_history, resources, user_resources, users,
};
use crate::repositories::history::DayBounds;
use crate::repositories::resource::ResourceValues;
use crate::repositories::{
    HistoryRepository, HoldingRepository, IdentityRepository, OrganizationRepository,
    ResourceRepository, UserRepository,
};

/// Maps a database error onto the store taxonomy.
///
/// Unique violations become [`StoreError::Conflict`], missing references become
/// [`StoreError::Rejected`]; everything else is a backend failure.
pub fn store_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => return StoreError::Conflict(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
            return StoreError::rejected("ForeignKey", msg);
        }
        _ => {}
    }
    match err {
        DbErr::RecordNotFound(msg) => StoreError::rejected("NotFound", msg),
        other => {
            tracing::error!(error = %other, "Database operation failed");
            StoreError::Backend(other.to_string())
        }
    }
}

/// Store backed by a relational database.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    users: UserRepository,
    organizations: OrganizationRepository,
    resources: ResourceRepository,
    holdings: HoldingRepository,
    history: HistoryRepository,
    identity: IdentityRepository,
}

impl SeaOrmStore {
    /// Creates a store over an open connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            organizations: OrganizationRepository::new(db.clone()),
            resources: ResourceRepository::new(db.clone()),
            holdings: HoldingRepository::new(db.clone()),
            history: HistoryRepository::new(db.clone()),
            identity: IdentityRepository::new(db),
        }
    }
}

fn user_account(model: users::Model) -> UserAccount {
    UserAccount {
        id: UserId::from_uuid(model.id),
        email: model.email,
        handle: model.handle,
        balance: model.balance,
        organization_id: model.organization_id.map(OrganizationId::from_uuid),
        is_owner: model.is_owner,
        is_admin: model.is_admin,
        version: model.version,
    }
}

fn organization(model: organizations::Model) -> Organization {
    Organization {
        id: OrganizationId::from_uuid(model.id),
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn holding(model: user_resources::Model) -> Holding {
    Holding {
        user_id: UserId::from_uuid(model.user_id),
        resource_id: ResourceId(model.resource_id),
        quantity: model.quantity,
        version: model.version,
    }
}

fn resource(model: resources::Model) -> Resource {
    Resource {
        id: ResourceId(model.id),
        code: model.code,
        name: model.name,
        resource_type: model.resource_type,
        price_buy: model.price_buy,
        price_sell: model.price_sell,
        last_updated: model.last_updated.with_timezone(&Utc),
    }
}

fn balance_snapshot(model: balance_history::Model) -> Snapshot {
    Snapshot {
        id: model.id,
        subject: SubjectKey::Balance(UserId::from_uuid(model.user_id)),
        day: model.day,
        value: SnapshotValue::Balance(model.balance),
    }
}

fn quantity_snapshot(model: resource_quantity_history::Model) -> Snapshot {
    Snapshot {
        id: model.id,
        subject: SubjectKey::Quantity(
            UserId::from_uuid(model.user_id),
            ResourceId(model.resource_id),
        ),
        day: model.day,
        value: SnapshotValue::Quantity(model.quantity),
    }
}

fn values(fields: &ResourceFields) -> ResourceValues<'_> {
    ResourceValues {
        code: &fields.code,
        name: &fields.name,
        resource_type: &fields.resource_type,
        price_buy: fields.price_buy,
        price_sell: fields.price_sell,
    }
}

fn uuids(user_ids: &[UserId]) -> Vec<Uuid> {
    user_ids.iter().map(|id| id.into_inner()).collect()
}

fn bounds(range: DateRange) -> DayBounds {
    DayBounds {
        from: range.lower(),
        to: range.upper(),
    }
}

fn mismatch(subject: SubjectKey, value: SnapshotValue) -> StoreError {
    StoreError::rejected(
        "SnapshotMismatch",
        format!("{value:?} cannot be stored as the {subject}"),
    )
}

#[async_trait]
impl LedgerStore for SeaOrmStore {
    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<UserAccount>> {
        let model = self
            .users
            .find_by_id(user_id.into_inner())
            .await
            .map_err(store_err)?;
        Ok(model.map(user_account))
    }

    async fn compare_and_set_balance(
        &self,
        user_id: UserId,
        expected_version: i64,
        balance: i64,
    ) -> StoreResult<bool> {
        self.users
            .compare_and_set_balance(user_id.into_inner(), expected_version, balance)
            .await
            .map_err(store_err)
    }

    async fn find_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Option<Holding>> {
        let model = self
            .holdings
            .find(user_id.into_inner(), resource_id.into_inner())
            .await
            .map_err(store_err)?;
        Ok(model.map(holding))
    }

    async fn list_holdings(&self, user_id: UserId) -> StoreResult<Vec<Holding>> {
        self.holdings_of(&[user_id]).await
    }

    async fn holdings_of(&self, user_ids: &[UserId]) -> StoreResult<Vec<Holding>> {
        let models = self
            .holdings
            .list_for_users(&uuids(user_ids))
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(holding).collect())
    }

    async fn attach_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Holding> {
        let model = self
            .holdings
            .attach(user_id.into_inner(), resource_id.into_inner())
            .await
            .map_err(store_err)?;
        Ok(holding(model))
    }

    async fn compare_and_set_quantity(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        expected_version: i64,
        quantity: f64,
    ) -> StoreResult<bool> {
        self.holdings
            .compare_and_set_quantity(
                user_id.into_inner(),
                resource_id.into_inner(),
                expected_version,
                quantity,
            )
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl HistoryStore for SeaOrmStore {
    async fn find_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
    ) -> StoreResult<Option<Snapshot>> {
        match subject {
            SubjectKey::Balance(user_id) => {
                let model = self
                    .history
                    .find_balance(user_id.into_inner(), day)
                    .await
                    .map_err(store_err)?;
                Ok(model.map(balance_snapshot))
            }
            SubjectKey::Quantity(user_id, resource_id) => {
                let model = self
                    .history
                    .find_quantity(user_id.into_inner(), resource_id.into_inner(), day)
                    .await
                    .map_err(store_err)?;
                Ok(model.map(quantity_snapshot))
            }
        }
    }

    async fn insert_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot> {
        match (subject, value) {
            (SubjectKey::Balance(user_id), SnapshotValue::Balance(balance)) => self
                .history
                .insert_balance(user_id.into_inner(), day, balance)
                .await
                .map(balance_snapshot)
                .map_err(store_err),
            (SubjectKey::Quantity(user_id, resource_id), SnapshotValue::Quantity(quantity)) => {
                self.history
                    .insert_quantity(
                        user_id.into_inner(),
                        resource_id.into_inner(),
                        day,
                        quantity,
                    )
                    .await
                    .map(quantity_snapshot)
                    .map_err(store_err)
            }
            _ => Err(mismatch(subject, value)),
        }
    }

    async fn update_snapshot(
        &self,
        subject: SubjectKey,
        id: i64,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot> {
        match (subject, value) {
            (SubjectKey::Balance(_), SnapshotValue::Balance(balance)) => self
                .history
                .update_balance(id, balance)
                .await
                .map(balance_snapshot)
                .map_err(store_err),
            (SubjectKey::Quantity(..), SnapshotValue::Quantity(quantity)) => self
                .history
                .update_quantity(id, quantity)
                .await
                .map(quantity_snapshot)
                .map_err(store_err),
            _ => Err(mismatch(subject, value)),
        }
    }

    async fn balance_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<BalanceSnapshot>> {
        let models = self
            .history
            .balance_range(&uuids(user_ids), bounds(range))
            .await
            .map_err(store_err)?;
        Ok(models
            .into_iter()
            .map(|m| BalanceSnapshot {
                id: m.id,
                user_id: UserId::from_uuid(m.user_id),
                day: m.day,
                balance: m.balance,
            })
            .collect())
    }

    async fn quantity_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<QuantitySnapshot>> {
        let models = self
            .history
            .quantity_range(&uuids(user_ids), bounds(range))
            .await
            .map_err(store_err)?;
        Ok(models
            .into_iter()
            .map(|m| QuantitySnapshot {
                id: m.id,
                user_id: UserId::from_uuid(m.user_id),
                resource_id: ResourceId(m.resource_id),
                day: m.day,
                quantity: m.quantity,
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for SeaOrmStore {
    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let models = self.users.list().await.map_err(store_err)?;
        Ok(models.into_iter().map(user_account).collect())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<UserAccount> {
        self.users
            .create(user.id.into_inner(), &user.email, user.handle.as_deref())
            .await
            .map(user_account)
            .map_err(store_err)
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        email: Option<String>,
        handle: Option<String>,
    ) -> StoreResult<Option<UserAccount>> {
        let model = self
            .users
            .update_profile(user_id.into_inner(), email, handle)
            .await
            .map_err(store_err)?;
        Ok(model.map(user_account))
    }

    async fn delete_user(&self, user_id: UserId) -> StoreResult<bool> {
        self.users
            .delete(user_id.into_inner())
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl OrganizationStore for SeaOrmStore {
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Option<Organization>> {
        let model = self
            .organizations
            .find_by_id(organization_id.into_inner())
            .await
            .map_err(store_err)?;
        Ok(model.map(organization))
    }

    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let models = self.organizations.list().await.map_err(store_err)?;
        Ok(models.into_iter().map(organization).collect())
    }

    async fn create_organization(
        &self,
        organization: &Organization,
        founder: UserId,
    ) -> StoreResult<()> {
        let claim_value = organization.id.to_string();
        let model = organizations::Model {
            id: organization.id.into_inner(),
            name: organization.name.clone(),
            created_at: organization.created_at.into(),
        };
        self.organizations
            .create_with_founder(
                model,
                founder.into_inner(),
                (ORGANIZATION_CLAIM, &claim_value),
                &[OWNER_ROLE, ADMIN_ROLE],
            )
            .await
            .map_err(store_err)
    }

    async fn members(&self, organization_id: OrganizationId) -> StoreResult<Vec<UserAccount>> {
        let models = self
            .users
            .members(organization_id.into_inner())
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(user_account).collect())
    }

    async fn set_membership(&self, user_id: UserId, membership: Membership) -> StoreResult<bool> {
        self.users
            .set_membership(
                user_id.into_inner(),
                membership.organization_id.map(OrganizationId::into_inner),
                membership.is_owner,
                membership.is_admin,
            )
            .await
            .map_err(store_err)
    }

    async fn delete_organization(&self, organization_id: OrganizationId) -> StoreResult<bool> {
        self.organizations
            .delete(organization_id.into_inner())
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl CatalogStore for SeaOrmStore {
    async fn list_resources(&self) -> StoreResult<Vec<Resource>> {
        let models = self.resources.list().await.map_err(store_err)?;
        Ok(models.into_iter().map(resource).collect())
    }

    async fn find_resource(&self, resource_id: ResourceId) -> StoreResult<Option<Resource>> {
        let model = self
            .resources
            .find_by_id(resource_id.into_inner())
            .await
            .map_err(store_err)?;
        Ok(model.map(resource))
    }

    async fn find_resource_by_code(&self, code: &str) -> StoreResult<Option<Resource>> {
        let model = self
            .resources
            .find_by_code(code)
            .await
            .map_err(store_err)?;
        Ok(model.map(resource))
    }

    async fn insert_resource(
        &self,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource> {
        self.resources
            .insert(&values(fields), now.into())
            .await
            .map(resource)
            .map_err(store_err)
    }

    async fn update_resource(
        &self,
        resource_id: ResourceId,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource> {
        self.resources
            .update(resource_id.into_inner(), &values(fields), now.into())
            .await
            .map(resource)
            .map_err(store_err)
    }
}

#[async_trait]
impl IdentityStore for SeaOrmStore {
    async fn role_exists(&self, name: &str) -> StoreResult<bool> {
        let role = self.identity.find_role(name).await.map_err(store_err)?;
        Ok(role.is_some())
    }

    async fn create_role(&self, name: &str) -> StoreResult<()> {
        self.identity
            .create_role(name)
            .await
            .map(|_| ())
            .map_err(store_err)
    }

    async fn roles_of(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        self.identity
            .roles_of(user_id.into_inner())
            .await
            .map_err(store_err)
    }

    async fn add_role(&self, user_id: UserId, role: &str) -> StoreResult<()> {
        let Some(found) = self.identity.find_role(role).await.map_err(store_err)? else {
            return Err(StoreError::rejected(
                "RoleNotFound",
                format!("Role {role} does not exist"),
            ));
        };
        self.identity
            .grant_role(user_id.into_inner(), found.id)
            .await
            .map_err(store_err)
    }

    async fn remove_role(&self, user_id: UserId, role: &str) -> StoreResult<()> {
        let Some(found) = self.identity.find_role(role).await.map_err(store_err)? else {
            return Ok(());
        };
        self.identity
            .revoke_role(user_id.into_inner(), found.id)
            .await
            .map_err(store_err)
    }

    async fn claims_of(&self, user_id: UserId) -> StoreResult<Vec<Claim>> {
        let models = self
            .identity
            .claims_of(user_id.into_inner())
            .await
            .map_err(store_err)?;
        Ok(models
            .into_iter()
            .map(|m| Claim::new(m.claim_type, m.claim_value))
            .collect())
    }

    async fn add_claim(&self, user_id: UserId, claim: &Claim) -> StoreResult<()> {
        self.identity
            .add_claim(user_id.into_inner(), &claim.claim_type, &claim.value)
            .await
            .map_err(store_err)
    }

    async fn remove_claim(&self, user_id: UserId, claim: &Claim) -> StoreResult<()> {
        self.identity
            .remove_claim(user_id.into_inner(), &claim.claim_type, &claim.value)
            .await
            .map_err(store_err)
    }
}
