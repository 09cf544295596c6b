//! Resource catalog routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use starledger_core::catalog::CatalogEntry;
use starledger_shared::requests::UpsertResourceRequest;
use starledger_shared::types::ResourceId;

use super::collection;
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the catalog router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/resources", get(list_resources).post(upsert_resources))
        .route("/resources/{resource_id}", get(get_resource))
}

/// GET /resources
async fn list_resources(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(collection(state.catalog.list().await?))
}

/// POST /resources - Upsert catalog entries by code. Developer policy.
async fn upsert_resources(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<Vec<UpsertResourceRequest>>,
) -> ApiResult<Response> {
    let entries = payload
        .into_iter()
        .map(|r| CatalogEntry {
            code: r.code,
            name: r.name,
            resource_type: r.resource_type,
            price_buy: r.price_buy,
            price_sell: r.price_sell,
        })
        .collect();
    let resources = state.catalog.upsert(auth.principal(), entries).await?;
    Ok(Json(resources).into_response())
}

/// GET `/resources/{resource_id}`
async fn get_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<ResourceId>,
) -> ApiResult<Response> {
    Ok(Json(state.catalog.get(resource_id).await?).into_response())
}
