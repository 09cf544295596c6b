//! Test doubles shared by the unit test modules.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use starledger_shared::types::{ResourceId, UserId};

use crate::history::{DateRange, Snapshot, SnapshotValue, SubjectKey};
use crate::records::{
    BalanceSnapshot, Holding, NewUser, QuantitySnapshot, Resource, ResourceFields, UserAccount,
};
use crate::store::{
    CatalogStore, HistoryStore, LedgerStore, MemoryStore, StoreError, StoreResult, UserStore,
};

/// Memory store whose history writes can be switched off.
#[derive(Debug, Default)]
pub struct FlakyHistoryStore {
    pub inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyHistoryStore {
    pub fn fail_history(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("history table unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerStore for FlakyHistoryStore {
    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<UserAccount>> {
        self.inner.find_user(user_id).await
    }

    async fn compare_and_set_balance(
        &self,
        user_id: UserId,
        expected_version: i64,
        balance: i64,
    ) -> StoreResult<bool> {
        self.inner
            .compare_and_set_balance(user_id, expected_version, balance)
            .await
    }

    async fn find_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Option<Holding>> {
        self.inner.find_holding(user_id, resource_id).await
    }

    async fn list_holdings(&self, user_id: UserId) -> StoreResult<Vec<Holding>> {
        self.inner.list_holdings(user_id).await
    }

    async fn holdings_of(&self, user_ids: &[UserId]) -> StoreResult<Vec<Holding>> {
        self.inner.holdings_of(user_ids).await
    }

    async fn attach_holding(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> StoreResult<Holding> {
        self.inner.attach_holding(user_id, resource_id).await
    }

    async fn compare_and_set_quantity(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        expected_version: i64,
        quantity: f64,
    ) -> StoreResult<bool> {
        self.inner
            .compare_and_set_quantity(user_id, resource_id, expected_version, quantity)
            .await
    }
}

#[async_trait]
impl HistoryStore for FlakyHistoryStore {
    async fn find_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
    ) -> StoreResult<Option<Snapshot>> {
        self.check()?;
        self.inner.find_snapshot(subject, day).await
    }

    async fn insert_snapshot(
        &self,
        subject: SubjectKey,
        day: NaiveDate,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot> {
        self.check()?;
        self.inner.insert_snapshot(subject, day, value).await
    }

    async fn update_snapshot(
        &self,
        subject: SubjectKey,
        id: i64,
        value: SnapshotValue,
    ) -> StoreResult<Snapshot> {
        self.check()?;
        self.inner.update_snapshot(subject, id, value).await
    }

    async fn balance_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<BalanceSnapshot>> {
        self.inner.balance_history(user_ids, range).await
    }

    async fn quantity_history(
        &self,
        user_ids: &[UserId],
        range: DateRange,
    ) -> StoreResult<Vec<QuantitySnapshot>> {
        self.inner.quantity_history(user_ids, range).await
    }
}

#[async_trait]
impl CatalogStore for FlakyHistoryStore {
    async fn list_resources(&self) -> StoreResult<Vec<Resource>> {
        self.inner.list_resources().await
    }

    async fn find_resource(&self, resource_id: ResourceId) -> StoreResult<Option<Resource>> {
        self.inner.find_resource(resource_id).await
    }

    async fn find_resource_by_code(&self, code: &str) -> StoreResult<Option<Resource>> {
        self.inner.find_resource_by_code(code).await
    }

    async fn insert_resource(
        &self,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource> {
        self.inner.insert_resource(fields, now).await
    }

    async fn update_resource(
        &self,
        resource_id: ResourceId,
        fields: &ResourceFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Resource> {
        self.inner.update_resource(resource_id, fields, now).await
    }
}

/// Registers a user and sets their balance directly.
pub async fn seed_user(store: &MemoryStore, email: &str, balance: i64) -> UserAccount {
    let user = store
        .create_user(NewUser {
            id: UserId::new(),
            email: email.to_string(),
            handle: None,
        })
        .await
        .unwrap();
    assert!(store.compare_and_set_balance(user.id, 0, balance).await.unwrap());
    store.find_user(user.id).await.unwrap().unwrap()
}

/// Inserts a catalog entry.
pub async fn seed_resource(store: &MemoryStore, code: &str) -> Resource {
    store
        .insert_resource(
            &ResourceFields {
                code: code.to_string(),
                name: format!("{code} ore"),
                resource_type: "Metal".to_string(),
                price_buy: 10.0,
                price_sell: 8.0,
            },
            Utc::now(),
        )
        .await
        .unwrap()
}
