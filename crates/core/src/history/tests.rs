//! Snapshotter and reconciler behaviour.

use std::sync::Arc;

use chrono::NaiveDate;
use starledger_shared::types::{ResourceId, UserId};

use super::{
    DateRange, HistoryReconciler, HistorySnapshotter, PendingSnapshots, SnapshotValue, SubjectKey,
};
use crate::store::{HistoryStore, LedgerStore, MemoryStore};
use crate::testing::{seed_resource, seed_user};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

#[tokio::test]
async fn test_second_snapshot_overwrites_in_place() {
    let store = Arc::new(MemoryStore::new());
    let snapshotter = HistorySnapshotter::new(Arc::clone(&store));
    let subject = SubjectKey::Balance(UserId::new());

    let first = snapshotter
        .snapshot(subject, day(1), SnapshotValue::Balance(10))
        .await
        .unwrap();
    let second = snapshotter
        .snapshot(subject, day(1), SnapshotValue::Balance(20))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.value, SnapshotValue::Balance(20));
}

#[tokio::test]
async fn test_different_days_get_their_own_rows() {
    let store = Arc::new(MemoryStore::new());
    let snapshotter = HistorySnapshotter::new(Arc::clone(&store));
    let user_id = UserId::new();
    let subject = SubjectKey::Balance(user_id);

    for (d, value) in [(1, 5), (2, 6), (3, 7)] {
        snapshotter
            .snapshot(subject, day(d), SnapshotValue::Balance(value))
            .await
            .unwrap();
    }

    let rows = store
        .balance_history(&[user_id], DateRange::new(Some(day(2)), Some(day(3))).unwrap())
        .await
        .unwrap();
    let values: Vec<_> = rows.iter().map(|row| row.balance).collect();
    assert_eq!(values, vec![6, 7]);
}

#[tokio::test]
async fn test_concurrent_first_snapshots_leave_one_row() {
    let store = Arc::new(MemoryStore::new());
    let subject = SubjectKey::Quantity(UserId::new(), ResourceId(1));

    let mut tasks = Vec::new();
    for i in 0..20 {
        let snapshotter = HistorySnapshotter::new(Arc::clone(&store));
        tasks.push(tokio::spawn(async move {
            snapshotter
                .snapshot(subject, day(1), SnapshotValue::Quantity(f64::from(i)))
                .await
                .unwrap()
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert!(store.find_snapshot(subject, day(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_reconcile_skips_deleted_subjects() {
    let store = Arc::new(MemoryStore::new());
    let pending = PendingSnapshots::new();
    pending.record(SubjectKey::Balance(UserId::new()), day(1));

    let report = HistoryReconciler::new(Arc::clone(&store), pending.clone())
        .run_once()
        .await;

    assert_eq!(report.skipped, 1);
    assert!(pending.is_empty());
}

#[tokio::test]
async fn test_reconcile_writes_live_value() {
    let store = Arc::new(MemoryStore::new());
    let user = seed_user(&store, "a@example.com", 42).await;
    let reconciler = HistoryReconciler::new(Arc::clone(&store), PendingSnapshots::new());

    let snapshot = reconciler
        .reconcile(SubjectKey::Balance(user.id), day(9))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(snapshot.value, SnapshotValue::Balance(42));
    assert_eq!(snapshot.day, day(9));
}

#[tokio::test]
async fn test_reconcile_skips_day_superseded_by_later_row() {
    let store = Arc::new(MemoryStore::new());
    let user = seed_user(&store, "a@example.com", 42).await;
    let subject = SubjectKey::Balance(user.id);
    store
        .insert_snapshot(subject, day(10), SnapshotValue::Balance(42))
        .await
        .unwrap();
    let pending = PendingSnapshots::new();
    pending.record(subject, day(9));

    let report = HistoryReconciler::new(Arc::clone(&store), pending.clone())
        .run_once()
        .await;

    assert_eq!(report.skipped, 1);
    assert_eq!(report.reconciled, 0);
    assert!(pending.is_empty());
    assert!(store.find_snapshot(subject, day(9)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reconcile_ignores_later_rows_of_other_resources() {
    let store = Arc::new(MemoryStore::new());
    let user = seed_user(&store, "a@example.com", 0).await;
    let iron = seed_resource(&store, "IRON").await;
    let gold = seed_resource(&store, "GOLD").await;
    store.attach_holding(user.id, iron.id).await.unwrap();
    store
        .insert_snapshot(
            SubjectKey::Quantity(user.id, gold.id),
            day(10),
            SnapshotValue::Quantity(1.0),
        )
        .await
        .unwrap();
    let reconciler = HistoryReconciler::new(Arc::clone(&store), PendingSnapshots::new());

    let snapshot = reconciler
        .reconcile(SubjectKey::Quantity(user.id, iron.id), day(9))
        .await
        .unwrap();

    assert!(snapshot.is_some());
}
