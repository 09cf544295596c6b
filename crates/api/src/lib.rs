//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use starledger_core::Clock;
use starledger_core::catalog::CatalogManager;
use starledger_core::history::{HistoryReconciler, PendingSnapshots};
use starledger_core::ledger::{BalanceLedger, ResourceLedger};
use starledger_core::organization::{OrganizationAggregator, OrganizationService};
use starledger_core::users::UserDirectory;
use starledger_db::SeaOrmStore;
use starledger_shared::JwtService;
use starledger_shared::config::{AuthConfig, LedgerConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store backing every service.
    pub store: Arc<SeaOrmStore>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Name of the cookie that may carry the access token.
    pub cookie_name: Arc<str>,
    /// User balances.
    pub balances: Arc<BalanceLedger<SeaOrmStore>>,
    /// User resource quantities.
    pub resources: Arc<ResourceLedger<SeaOrmStore>>,
    /// Organization membership.
    pub organizations: Arc<OrganizationService<SeaOrmStore>>,
    /// Organization rollups.
    pub aggregator: Arc<OrganizationAggregator<SeaOrmStore>>,
    /// Resource catalog.
    pub catalog: Arc<CatalogManager<SeaOrmStore>>,
    /// User profiles.
    pub users: Arc<UserDirectory<SeaOrmStore>>,
    /// Rewrites history rows whose snapshot failed.
    pub reconciler: Arc<HistoryReconciler<SeaOrmStore>>,
}

impl AppState {
    /// Wires every service over one database connection.
    ///
    /// Both ledgers share one pending-snapshot queue, drained by `reconciler`.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        clock: Arc<dyn Clock>,
        ledger: &LedgerConfig,
        auth: &AuthConfig,
    ) -> Self {
        let store = Arc::new(SeaOrmStore::new(db));
        let pending = PendingSnapshots::new();

        Self {
            balances: Arc::new(
                BalanceLedger::new(Arc::clone(&store), Arc::clone(&clock), pending.clone())
                    .with_max_attempts(ledger.max_update_attempts),
            ),
            resources: Arc::new(
                ResourceLedger::new(Arc::clone(&store), Arc::clone(&clock), pending.clone())
                    .with_max_attempts(ledger.max_update_attempts),
            ),
            organizations: Arc::new(
                OrganizationService::new(Arc::clone(&store), Arc::clone(&clock))
                    .revoke_grants_on_removal(ledger.revoke_grants_on_removal),
            ),
            aggregator: Arc::new(OrganizationAggregator::new(Arc::clone(&store))),
            catalog: Arc::new(CatalogManager::new(Arc::clone(&store), clock)),
            users: Arc::new(UserDirectory::new(Arc::clone(&store))),
            reconciler: Arc::new(HistoryReconciler::new(Arc::clone(&store), pending)),
            jwt_service: Arc::new(jwt_service),
            cookie_name: Arc::from(auth.cookie_name.as_str()),
            store,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
