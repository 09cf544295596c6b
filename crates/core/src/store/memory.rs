//! In-process arena store.
//!
//! Users and organizations are keyed by id. Membership is held twice: as the
//! back-reference on each user and as an organization to members index. Every
//! mutation that touches one updates the other, and [`MemoryStore::check_invariants`]
//! verifies they agree.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use starledger_shared::types::{OrganizationId, ResourceId, UserId};
use tokio::sync::RwLock;

use super::{
    CatalogStore, HistoryStore, IdentityStore, LedgerStore, OrganizationStore, StoreError,
    StoreResult, UserStore,
};
use crate::auth::{ADMIN_ROLE, ORGANIZATION_CLAIM, OWNER_ROLE};
use crate::history::{DateRange, Snapshot, SnapshotValue, SubjectKey};
use crate::records::{
    BalanceSnapshot, Claim, Holding, Membership, NewUser, Organization, QuantitySnapshot,
    Resource, ResourceFields, UserAccount,
};

#[derive(Debug, Default)]
struct Arena {
    users: HashMap<UserId, UserAccount>,
    organizations: HashMap<OrganizationId, Organization>,
    members: HashMap<OrganizationId, BTreeSet<UserId>>,
    holdings: BTreeMap<(UserId, ResourceId), Holding>,
    resources: BTreeMap<ResourceId, Resource>,
    last_resource_id: i32,
    history: BTreeMap<(SubjectKey, NaiveDate), Snapshot>,
    last_snapshot_id: i64,
    roles: BTreeSet<String>,
    user_roles: HashMap<UserId, BTreeSet<String>>,
    user_claims: HashMap<UserId, BTreeSet<Claim>>,
}

impl Arena {
    fn relink(&mut self, user_id: UserId, membership: Membership) -> bool {
        let Some(user) = self.users.get_mut(&user_id) else {
            return false;
        };
        let previous = user.organization_id;
        user.organization_id = membership.organization_id;
        user.is_owner = membership.is_owner;
        user.is_admin = membership.is_admin;

        if let Some(previous) = previous
            && let Some(members) = self.members.get_mut(&previous)
        {
            members.remove(&user_id);
        }
        if let Some(next) = membership.organization_id {
            self.members.entry(next).or_default().insert(user_id);
        }
        true
    }

    fn grant_role(&mut self, user_id: UserId, role: &str) -> StoreResult<()> {
        if !self.roles.contains(role) {
            return Err(StoreError::rejected(
                "RoleNotFound",
                format!("Role {role} does not exist"),
            ));
        }
        self.user_roles
            .entry(user_id)
            .or_default()
            .insert(role.to_string());
        Ok(())
    }

    fn snapshot_for(&self, subject: SubjectKey, range: DateRange) -> impl Iterator<Item = &Snapshot> {
        self.history
            .values()
            .filter(move |snapshot| snapshot.subject == subject && range.contains(snapshot.day))
    }
}

/// Store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: RwLock<Arena>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies that user back-references and the members index agree, and
    /// that no stored value is negative.
    pub async fn check_invariants(&self) -> Result<(), String> {
        let arena = self.arena.read().await;

        for user in arena.users.values() {
            if user.balance < 0 {
                return Err(format!("user {} has negative balance", user.id));
            }
            if let Some(organization_id) = user.organization_id {
                if !arena.organizations.contains_key(&organization_id) {
                    return Err(format!(
                        "user {} references missing organization {organization_id}",
                        user.id
                    ));
                }
                let indexed = arena
                    .members
                    .get(&organization_id)
                    .is_some_and(|members| members.contains(&user.id));
                if !indexed {
                    return Err(format!(
                        "user {} missing from members of {organization_id}",
                        user.id
                    ));
                }
            }
        }

        for (organization_id, members) in &arena.members {
            for user_id in members {
                let linked = arena
                    .users
                    .get(user_id)
                    .is_some_and(|user| user.belongs_to(*organization_id));
                if !linked {
                    return Err(format!(
                        "members of {organization_id} list {user_id} without back-reference"
                    ));
                }
            }
        }

        if let Some(holding) = arena.holdings.values().find(|h| h.quantity < 0.0) {
            return Err(format!(
                "holding of resource {} by {} is negative",
                holding.resource_id, holding.user_id
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self.arena.read().await.users.get(&user_id).cloned())
    }

    async fn compare_and_set_balance(
        &self,
        user_id: UserId,
        expected_version: i64,
        balance: i64,
    ) -> StoreResult<bool> {
        let mut arena = self.arena.write().await;
        match arena.users.get_mut(&user_id) {
            Some(user) if user.version == expected_version => {
                user.balance = balance;
                user.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Option<Holding>> {
        Ok(self
            .arena
            .read()
            .await
            .holdings
            .get(&(user_id, resource_id))
            .cloned())
    }

    async fn list_holdings(&self, user_id: UserId) -> StoreResult<Vec<Holding>> {
        Ok(self
            .arena
            .read()
            .await
            .holdings
            .values()
            .filter(|holding| holding.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn holdings_of(&self, user_ids: &[UserId]) -> StoreResult<Vec<Holding>> {
        Ok(self
            .arena
            .read()
            .await
            .holdings
            .values()
            .filter(|holding| user_ids.contains(&holding.user_id))
            .cloned()
            .collect())
    }

    async fn attach_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Holding> {
        let mut arena = self.arena.write().await;
        if !arena.users.contains_key(&user_id) || !arena.resources.contains_key(&resource_id) {
            return Err(StoreError::rejected(
                "ForeignKey",
                "user or resource does not exist",
            ));
        }
        let holding = arena
            .holdings
            .entry((user_id, resource_id))
            .or_insert_with(|| Holding {
                user_id,
                resource_id,
                quantity: 0.0,
                version: 0,
            });
        Ok(holding.clone())
    }

    async fn compare_and_set_quantity(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        expected_version: i64,
        quantity: f64,
    ) -> StoreResult<bool> {
        let mut arena = self.arena.write().await;
        match arena.holdings.get_mut(&(user_id, resource_id)) {
            Some(holding) if holding.version == expected_version => {
                holding.quantity = quantity;
                holding.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn find_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
    ) -> StoreResult<Option<Snapshot>> {
        Ok(self.arena.read().await.history.get(&(subject, day)).cloned())
    }

    async fn insert_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot> {
        let mut arena = self.arena.write().await;
        if arena.history.contains_key(&(subject, day)) {
            return Err(StoreError::Conflict(format!(
                "snapshot of {subject} for {day} already exists"
            )));
        }
        arena.last_snapshot_id += 1;
        let snapshot = Snapshot {
            id: arena.last_snapshot_id,
            subject,
            day,
            value,
        };
        arena.history.insert((subject, day), snapshot.clone());
        Ok(snapshot)
    }

    async fn update_snapshot(
        &self,
        subject: SubjectKey,
        id: i64,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot> {
        let mut arena = self.arena.write().await;
        let snapshot = arena
            .history
            .values_mut()
            .find(|snapshot| snapshot.id == id && snapshot.subject == subject)
            .ok_or_else(|| StoreError::Backend(format!("snapshot {id} vanished")))?;
        snapshot.value = value;
        Ok(snapshot.clone())
    }

    async fn balance_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<BalanceSnapshot>> {
        let arena = self.arena.read().await;
        let mut rows: Vec<BalanceSnapshot> = user_ids
            .iter()
            .flat_map(|user_id| arena.snapshot_for(SubjectKey::Balance(*user_id), range))
            .filter_map(|snapshot| match (snapshot.subject, snapshot.value) {
                (SubjectKey::Balance(user_id), SnapshotValue::Balance(balance)) => {
                    Some(BalanceSnapshot {
                        id: snapshot.id,
                        user_id,
                        day: snapshot.day,
                        balance,
                    })
                }
                _ => None,
            })
            .collect();
        rows.sort_by_key(|row| (row.day, row.id));
        Ok(rows)
    }

    async fn quantity_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<QuantitySnapshot>> {
        let arena = self.arena.read().await;
        let mut rows: Vec<QuantitySnapshot> = arena
            .history
            .values()
            .filter(|snapshot| {
                user_ids.contains(&snapshot.subject.user_id()) && range.contains(snapshot.day)
            })
            .filter_map(|snapshot| match (snapshot.subject, snapshot.value) {
                (SubjectKey::Quantity(user_id, resource_id), SnapshotValue::Quantity(quantity)) => {
                    Some(QuantitySnapshot {
                        id: snapshot.id,
                        user_id,
                        resource_id,
                        day: snapshot.day,
                        quantity,
                    })
                }
                _ => None,
            })
            .collect();
        rows.sort_by_key(|row| (row.day, row.id));
        Ok(rows)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let mut users: Vec<UserAccount> =
            self.arena.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<UserAccount> {
        let mut arena = self.arena.write().await;
        if arena.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("User {} already exists", user.id)));
        }
        if arena.users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "Email {} is already registered",
                user.email
            )));
        }
        let account = UserAccount {
            id: user.id,
            email: user.email,
            handle: user.handle,
            balance: 0,
            organization_id: None,
            is_owner: false,
            is_admin: false,
            version: 0,
        };
        arena.users.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        email: Option<String>,
        handle: Option<String>,
    ) -> StoreResult<Option<UserAccount>> {
        let mut arena = self.arena.write().await;
        if let Some(email) = &email
            && arena
                .users
                .values()
                .any(|other| other.id != user_id && &other.email == email)
        {
            return Err(StoreError::Conflict(format!(
                "Email {email} is already registered"
            )));
        }
        let Some(user) = arena.users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(email) = email {
            user.email = email;
        }
        if handle.is_some() {
            user.handle = handle;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: UserId) -> StoreResult<bool> {
        let mut arena = self.arena.write().await;
        if !arena.relink(user_id, Membership::none()) {
            return Ok(false);
        }
        arena.users.remove(&user_id);
        arena.holdings.retain(|(holder, _), _| *holder != user_id);
        arena
            .history
            .retain(|(subject, _), _| subject.user_id() != user_id);
        arena.user_roles.remove(&user_id);
        arena.user_claims.remove(&user_id);
        Ok(true)
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Option<Organization>> {
        Ok(self
            .arena
            .read()
            .await
            .organizations
            .get(&organization_id)
            .cloned())
    }

    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let mut organizations: Vec<Organization> = self
            .arena
            .read()
            .await
            .organizations
            .values()
            .cloned()
            .collect();
        organizations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(organizations)
    }

    async fn create_organization(
        &self,
        organization: &Organization,
        founder: UserId,
    ) -> StoreResult<()> {
        let mut arena = self.arena.write().await;
        if !arena.users.contains_key(&founder) {
            return Err(StoreError::rejected(
                "UserNotFound",
                format!("User {founder} does not exist"),
            ));
        }
        for role in [OWNER_ROLE, ADMIN_ROLE] {
            if !arena.roles.contains(role) {
                return Err(StoreError::rejected(
                    "RoleNotFound",
                    format!("Role {role} does not exist"),
                ));
            }
        }

        arena
            .organizations
            .insert(organization.id, organization.clone());
        arena.relink(founder, Membership::founder(organization.id));
        arena
            .user_claims
            .entry(founder)
            .or_default()
            .insert(Claim::new(ORGANIZATION_CLAIM, organization.id.to_string()));
        arena.grant_role(founder, OWNER_ROLE)?;
        arena.grant_role(founder, ADMIN_ROLE)?;
        Ok(())
    }

    async fn members(&self, organization_id: OrganizationId) -> StoreResult<Vec<UserAccount>> {
        let arena = self.arena.read().await;
        let mut members: Vec<UserAccount> = arena
            .members
            .get(&organization_id)
            .into_iter()
            .flatten()
            .filter_map(|user_id| arena.users.get(user_id).cloned())
            .collect();
        members.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(members)
    }

    async fn set_membership(&self, user_id: UserId, membership: Membership) -> StoreResult<bool> {
        let mut arena = self.arena.write().await;
        if let Some(organization_id) = membership.organization_id
            && !arena.organizations.contains_key(&organization_id)
        {
            return Err(StoreError::rejected(
                "OrganizationNotFound",
                format!("Organization {organization_id} does not exist"),
            ));
        }
        Ok(arena.relink(user_id, membership))
    }

    async fn delete_organization(&self, organization_id: OrganizationId) -> StoreResult<bool> {
        let mut arena = self.arena.write().await;
        if arena.organizations.remove(&organization_id).is_none() {
            return Ok(false);
        }
        let members = arena.members.remove(&organization_id).unwrap_or_default();
        for user_id in members {
            if let Some(user) = arena.users.get_mut(&user_id) {
                user.organization_id = None;
                user.is_owner = false;
                user.is_admin = false;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_resources(&self) -> StoreResult<Vec<Resource>> {
        Ok(self.arena.read().await.resources.values().cloned().collect())
    }

    async fn find_resource(&self, resource_id: ResourceId) -> StoreResult<Option<Resource>> {
        Ok(self.arena.read().await.resources.get(&resource_id).cloned())
    }

    async fn find_resource_by_code(&self, code: &str) -> StoreResult<Option<Resource>> {
        Ok(self
            .arena
            .read()
            .await
            .resources
            .values()
            .find(|resource| resource.code == code)
            .cloned())
    }

    async fn insert_resource(
        &self,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource> {
        let mut arena = self.arena.write().await;
        if arena.resources.values().any(|r| r.code == fields.code) {
            return Err(StoreError::Conflict(format!(
                "Resource code {} already exists",
                fields.code
            )));
        }
        arena.last_resource_id += 1;
        let resource = Resource {
            id: ResourceId(arena.last_resource_id),
            code: fields.code.clone(),
            name: fields.name.clone(),
            resource_type: fields.resource_type.clone(),
            price_buy: fields.price_buy,
            price_sell: fields.price_sell,
            last_updated: now,
        };
        arena.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn update_resource(
        &self,
        resource_id: ResourceId,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource> {
        let mut arena = self.arena.write().await;
        let resource = arena
            .resources
            .get_mut(&resource_id)
            .ok_or_else(|| StoreError::Backend(format!("resource {resource_id} vanished")))?;
        resource.name.clone_from(&fields.name);
        resource.resource_type.clone_from(&fields.resource_type);
        resource.price_buy = fields.price_buy;
        resource.price_sell = fields.price_sell;
        resource.last_updated = now;
        Ok(resource.clone())
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn role_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.arena.read().await.roles.contains(name))
    }

    async fn create_role(&self, name: &str) -> StoreResult<()> {
        self.arena.write().await.roles.insert(name.to_string());
        Ok(())
    }

    async fn roles_of(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        Ok(self
            .arena
            .read()
            .await
            .user_roles
            .get(&user_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_role(&self, user_id: UserId, role: &str) -> StoreResult<()> {
        self.arena.write().await.grant_role(user_id, role)
    }

    async fn remove_role(&self, user_id: UserId, role: &str) -> StoreResult<()> {
        if let Some(roles) = self.arena.write().await.user_roles.get_mut(&user_id) {
            roles.remove(role);
        }
        Ok(())
    }

    async fn claims_of(&self, user_id: UserId) -> StoreResult<Vec<Claim>> {
        Ok(self
            .arena
            .read()
            .await
            .user_claims
            .get(&user_id)
            .map(|claims| claims.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_claim(&self, user_id: UserId, claim: &Claim) -> StoreResult<()> {
        self.arena
            .write()
            .await
            .user_claims
            .entry(user_id)
            .or_default()
            .insert(claim.clone());
        Ok(())
    }

    async fn remove_claim(&self, user_id: UserId, claim: &Claim) -> StoreResult<()> {
        if let Some(claims) = self.arena.write().await.user_claims.get_mut(&user_id) {
            claims.remove(claim);
        }
        Ok(())
    }
}
