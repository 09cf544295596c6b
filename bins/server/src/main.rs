//! StarLedger API Server
//!
//! Main entry point for the StarLedger backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starledger_api::{AppState, create_router};
use starledger_core::SystemClock;
use starledger_core::auth::ensure_roles;
use starledger_core::history::HistoryReconciler;
use starledger_db::connect_with;
use starledger_db::migration::Migrator;
use starledger_db::SeaOrmStore;
use starledger_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database and bring the schema up to date
    let db = connect_with(&config.database).await?;
    info!("Connected to database");
    Migrator::up(&db, None).await?;

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: expiry_minutes(config.jwt.access_token_expiry_secs)?,
    });

    // Create application state
    let state = AppState::new(
        db,
        jwt_service,
        Arc::new(SystemClock),
        &config.ledger,
        &config.auth,
    );

    let created = ensure_roles(&*state.store).await?;
    if !created.is_empty() {
        info!(roles = ?created, "Bootstrapped roles");
    }

    tokio::spawn(reconcile_history(
        Arc::clone(&state.reconciler),
        Duration::from_secs(config.ledger.reconcile_interval_secs.max(1)),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodically rewrites history rows whose snapshot failed.
async fn reconcile_history(reconciler: Arc<HistoryReconciler<SeaOrmStore>>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let report = reconciler.run_once().await;
        if report.failed > 0 {
            warn!(failed = report.failed, "History rows still pending");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Token lifetime in whole minutes, as the JWT service expects it.
fn expiry_minutes(secs: u64) -> anyhow::Result<i64> {
    i64::try_from(secs / 60).context("jwt.access_token_expiry_secs is too large")
}
