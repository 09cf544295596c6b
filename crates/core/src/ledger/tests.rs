//! Ledger scenarios against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use starledger_shared::types::{ResourceId, UpdateMode, UserId};

use super::{BalanceLedger, LedgerError, ResourceLedger};
use crate::clock::ManualClock;
use crate::history::{DateRange, HistoryReconciler, PendingSnapshots, SubjectKey};
use crate::store::{HistoryStore, LedgerStore, MemoryStore};
use crate::testing::{FlakyHistoryStore, seed_resource, seed_user};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn balance_ledger<S: LedgerStore + HistoryStore>(
    store: &Arc<S>,
    clock: &Arc<ManualClock>,
    pending: &PendingSnapshots,
) -> BalanceLedger<S> {
    BalanceLedger::new(Arc::clone(store), clock.clone(), pending.clone())
}

#[tokio::test]
async fn test_add_records_todays_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = balance_ledger(&store, &clock, &PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 100).await;

    let update = ledger.apply(user.id, 50, UpdateMode::Add).await.unwrap();

    assert_eq!(update.balance, 150);
    assert!(update.snapshot_recorded);
    let history = ledger.history(user.id, DateRange::all()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].day, day(1));
    assert_eq!(history[0].balance, 150);
}

#[tokio::test]
async fn test_overdraw_rejected_without_side_effects() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = balance_ledger(&store, &clock, &PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 100).await;

    let err = ledger
        .apply(user.id, 150, UpdateMode::Subtract)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::NegativeBalance {
            balance: 100,
            requested: 150,
            ..
        }
    ));
    assert_eq!(ledger.balance(user.id).await.unwrap(), 100);
    assert!(
        ledger
            .history(user.id, DateRange::all())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_negative_set_rejected() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = balance_ledger(&store, &clock, &PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 100).await;

    let err = ledger.apply(user.id, -5, UpdateMode::Set).await.unwrap_err();

    assert!(matches!(err, LedgerError::NegativeBalance { .. }));
    assert!(err.is_invalid_operation());
    assert_eq!(ledger.balance(user.id).await.unwrap(), 100);
}

#[tokio::test]
async fn test_unknown_user_not_found() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = balance_ledger(&store, &clock, &PendingSnapshots::new());

    let err = ledger
        .apply(UserId::new(), 1, UpdateMode::Add)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::UserNotFound(_)));
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_same_day_updates_collapse_into_one_row() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = balance_ledger(&store, &clock, &PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 0).await;

    ledger.apply(user.id, 10, UpdateMode::Add).await.unwrap();
    ledger.apply(user.id, 3, UpdateMode::Subtract).await.unwrap();
    clock.advance(Duration::days(1));
    ledger.apply(user.id, 40, UpdateMode::Set).await.unwrap();

    let history = ledger.history(user.id, DateRange::all()).await.unwrap();
    let rows: Vec<_> = history.iter().map(|row| (row.day, row.balance)).collect();
    assert_eq!(rows, vec![(day(1), 7), (day(2), 40)]);
}

#[tokio::test]
async fn test_history_with_only_start_keeps_start() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = balance_ledger(&store, &clock, &PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 0).await;

    for d in 1..=3 {
        clock.set(day(d).and_hms_opt(9, 0, 0).unwrap().and_utc());
        ledger.apply(user.id, 1, UpdateMode::Add).await.unwrap();
    }

    let range = DateRange::new(Some(day(2)), None).unwrap();
    let days: Vec<_> = ledger
        .history(user.id, range)
        .await
        .unwrap()
        .iter()
        .map(|row| row.day)
        .collect();
    assert_eq!(days, vec![day(2), day(3)]);
}

#[tokio::test]
async fn test_concurrent_updates_lose_nothing() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = Arc::new(
        balance_ledger(&store, &clock, &PendingSnapshots::new()).with_max_attempts(1_000),
    );
    let user_id = seed_user(&store, "a@example.com", 0).await.id;

    let mut tasks = Vec::new();
    for i in 1..=50 {
        let ledger = Arc::clone(&ledger);
        tasks.push(tokio::spawn(async move {
            ledger.apply(user_id, i, UpdateMode::Add).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(ledger.balance(user_id).await.unwrap(), (1..=50).sum::<i64>());
    let history = ledger.history(user_id, DateRange::all()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].balance, 1275);
}

#[tokio::test]
async fn test_snapshot_failure_keeps_balance_and_reconciles() {
    let store = Arc::new(FlakyHistoryStore::default());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let pending = PendingSnapshots::new();
    let ledger = balance_ledger(&store, &clock, &pending);
    let user = seed_user(&store.inner, "a@example.com", 100).await;

    store.fail_history(true);
    let update = ledger.apply(user.id, 50, UpdateMode::Add).await.unwrap();

    assert_eq!(update.balance, 150);
    assert!(!update.snapshot_recorded);
    assert!(pending.contains(SubjectKey::Balance(user.id), day(1)));

    let reconciler = HistoryReconciler::new(Arc::clone(&store), pending.clone());
    let report = reconciler.run_once().await;
    assert_eq!(report.failed, 1);
    assert_eq!(pending.len(), 1);

    store.fail_history(false);
    let report = reconciler.run_once().await;
    assert_eq!(report.reconciled, 1);
    assert!(pending.is_empty());

    let history = ledger.history(user.id, DateRange::all()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].balance, 150);
    assert_eq!(ledger.balance(user.id).await.unwrap(), 150);
}

#[tokio::test]
async fn test_quantity_update_requires_holding() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = ResourceLedger::new(Arc::clone(&store), clock, PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 0).await;
    let iron = seed_resource(&store, "IRON").await;

    let err = ledger
        .apply(user.id, iron.id, 5.0, UpdateMode::Add)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::HoldingNotFound { .. }));

    ledger.attach(user.id, iron.id).await.unwrap();
    let update = ledger
        .apply(user.id, iron.id, 5.5, UpdateMode::Add)
        .await
        .unwrap();
    assert!((update.quantity - 5.5).abs() < f64::EPSILON);
    assert!(update.snapshot_recorded);
}

#[tokio::test]
async fn test_attach_is_idempotent_and_checks_catalog() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = ResourceLedger::new(Arc::clone(&store), clock, PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 0).await;
    let iron = seed_resource(&store, "IRON").await;

    ledger.attach(user.id, iron.id).await.unwrap();
    ledger
        .apply(user.id, iron.id, 2.0, UpdateMode::Set)
        .await
        .unwrap();
    let again = ledger.attach(user.id, iron.id).await.unwrap();
    assert!((again.quantity - 2.0).abs() < f64::EPSILON);

    let err = ledger.attach(user.id, ResourceId(999)).await.unwrap_err();
    assert!(matches!(err, LedgerError::ResourceNotFound(_)));
    let err = ledger.attach(UserId::new(), iron.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound(_)));
}

#[tokio::test]
async fn test_insufficient_quantity_rejected() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let ledger = ResourceLedger::new(Arc::clone(&store), clock, PendingSnapshots::new());
    let user = seed_user(&store, "a@example.com", 0).await;
    let iron = seed_resource(&store, "IRON").await;
    ledger.attach(user.id, iron.id).await.unwrap();
    ledger
        .apply(user.id, iron.id, 1.0, UpdateMode::Set)
        .await
        .unwrap();

    let err = ledger
        .apply(user.id, iron.id, 1.5, UpdateMode::Subtract)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientQuantity { .. }));

    let err = ledger
        .apply(user.id, iron.id, f64::NAN, UpdateMode::Add)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidQuantity));

    let holding = ledger.holding(user.id, iron.id).await.unwrap();
    assert!((holding.quantity - 1.0).abs() < f64::EPSILON);
    let history = ledger.history(user.id, DateRange::all()).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_quantity_snapshot_failure_reconciles() {
    let store = Arc::new(FlakyHistoryStore::default());
    let clock = Arc::new(ManualClock::at_day(day(1)));
    let pending = PendingSnapshots::new();
    let ledger = ResourceLedger::new(Arc::clone(&store), clock, pending.clone());
    let user = seed_user(&store.inner, "a@example.com", 0).await;
    let iron = seed_resource(&store.inner, "IRON").await;
    ledger.attach(user.id, iron.id).await.unwrap();

    store.fail_history(true);
    let update = ledger
        .apply(user.id, iron.id, 4.0, UpdateMode::Add)
        .await
        .unwrap();
    assert!(!update.snapshot_recorded);
    store.fail_history(false);

    let report = HistoryReconciler::new(Arc::clone(&store), pending.clone())
        .run_once()
        .await;
    assert_eq!(report.reconciled, 1);
    let history = ledger.history(user.id, DateRange::all()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!((history[0].quantity - 4.0).abs() < f64::EPSILON);
}
