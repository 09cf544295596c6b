//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - [`SeaOrmStore`], the core store traits over a live connection

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod store;

pub use repositories::{
    HistoryRepository, HoldingRepository, IdentityRepository, OrganizationRepository,
    ResourceRepository, UserRepository,
};
pub use store::{SeaOrmStore, store_err};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use starledger_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
