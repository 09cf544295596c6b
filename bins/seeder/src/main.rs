//! Database seeder for StarLedger development and testing.
//!
//! Seeds a developer account, a test organization with one extra member,
//! starting balances and a small resource catalog, then prints a bearer token
//! for the developer account.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use starledger_core::auth::{AuthScheme, DEVELOPER_ROLE, ensure_roles, load_principal};
use starledger_core::catalog::{CatalogEntry, CatalogManager};
use starledger_core::history::PendingSnapshots;
use starledger_core::ledger::BalanceLedger;
use starledger_core::organization::OrganizationService;
use starledger_core::records::NewUser;
use starledger_core::store::{IdentityStore, LedgerStore, UserStore};
use starledger_core::{Clock, SystemClock};
use starledger_db::SeaOrmStore;
use starledger_db::migration::Migrator;
use starledger_shared::types::{UpdateMode, UserId};
use starledger_shared::{AppConfig, JwtConfig, JwtService};

/// Developer account ID (consistent for all seeds)
const DEV_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);
/// Second member ID (consistent for all seeds)
const MEMBER_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0003);

const CATALOG: [(&str, &str, &str, f64, f64); 3] = [
    ("IRON", "Iron", "Metal", 2.4, 1.9),
    ("GOLD", "Gold", "Metal", 6.1, 5.8),
    ("QUAN", "Quantanium", "Mineral", 88.0, 84.5),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = starledger_db::connect_with(&config.database).await?;
    Migrator::up(&db, None).await?;
    let store = Arc::new(SeaOrmStore::new(db));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    println!("Ensuring roles...");
    ensure_roles(&*store).await?;

    println!("Seeding users...");
    let developer = UserId::from_uuid(DEV_USER_ID);
    let member = UserId::from_uuid(MEMBER_USER_ID);
    let fresh = seed_user(&store, developer, "dev@starledger.dev", "Developer").await?;
    seed_user(&store, member, "member@starledger.dev", "Wingman").await?;
    if !store
        .roles_of(developer)
        .await?
        .iter()
        .any(|r| r == DEVELOPER_ROLE)
    {
        store.add_role(developer, DEVELOPER_ROLE).await?;
    }

    if fresh {
        println!("Seeding test organization...");
        let organizations = OrganizationService::new(Arc::clone(&store), Arc::clone(&clock));
        let details = organizations.create(developer, "Test Squadron").await?;
        let owner = load_principal(&*store, developer, AuthScheme::Bearer).await?;
        organizations
            .add_member(&owner, details.organization.id, member)
            .await?;

        println!("Seeding balances...");
        let ledger = BalanceLedger::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            PendingSnapshots::new(),
        );
        ledger.apply(developer, 25_000, UpdateMode::Set).await?;
        ledger.apply(member, 4_200, UpdateMode::Set).await?;
    } else {
        println!("  Developer account already exists, skipping organization and balances...");
    }

    println!("Seeding resource catalog...");
    let developer_principal = load_principal(&*store, developer, AuthScheme::Bearer).await?;
    let catalog = CatalogManager::new(Arc::clone(&store), clock);
    let entries = CATALOG
        .iter()
        .map(|&(code, name, kind, price_buy, price_sell)| CatalogEntry {
            code: code.to_string(),
            name: name.to_string(),
            resource_type: kind.to_string(),
            price_buy,
            price_sell,
        })
        .collect();
    catalog.upsert(&developer_principal, entries).await?;

    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: 24 * 60,
    });
    println!("Seeding complete!");
    println!("Developer token: {}", jwt.generate_access_token(DEV_USER_ID)?);

    Ok(())
}

/// Registers a user unless they already exist. Returns whether they were created.
async fn seed_user(
    store: &SeaOrmStore,
    id: UserId,
    email: &str,
    handle: &str,
) -> anyhow::Result<bool> {
    if store.find_user(id).await?.is_some() {
        println!("  {email} already exists, skipping...");
        return Ok(false);
    }
    store
        .create_user(NewUser {
            id,
            email: email.to_string(),
            handle: Some(handle.to_string()),
        })
        .await?;
    Ok(true)
}
