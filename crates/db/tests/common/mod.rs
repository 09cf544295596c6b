//! Shared setup for database integration tests.
//!
//! Every test gets its own in-memory SQLite database with all migrations
//! applied. The pool is pinned to a single connection so the database lives
//! as long as the pool does.

#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use starledger_core::auth::ensure_roles;
use starledger_core::records::{NewUser, ResourceFields, UserAccount};
use starledger_core::store::{CatalogStore, UserStore};
use starledger_core::records::Resource;
use starledger_db::SeaOrmStore;
use starledger_db::migration::Migrator;
use starledger_shared::types::UserId;

/// Opens a migrated in-memory database.
pub async fn database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory SQLite");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Opens a migrated store with the required roles in place.
pub async fn store() -> Arc<SeaOrmStore> {
    let store = SeaOrmStore::new(database().await);
    ensure_roles(&store).await.expect("Failed to bootstrap roles");
    Arc::new(store)
}

/// Registers a user with the given email.
pub async fn user(store: &SeaOrmStore, email: &str) -> UserAccount {
    store
        .create_user(NewUser {
            id: UserId::new(),
            email: email.to_string(),
            handle: None,
        })
        .await
        .expect("Failed to create user")
}

/// Inserts a catalog resource.
pub async fn resource(store: &SeaOrmStore, code: &str) -> Resource {
    store
        .insert_resource(
            &ResourceFields {
                code: code.to_string(),
                name: format!("{code} ore"),
                resource_type: "Mineral".to_string(),
                price_buy: 10.0,
                price_sell: 8.0,
            },
            chrono::Utc::now(),
        )
        .await
        .expect("Failed to create resource")
}
