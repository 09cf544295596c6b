//! Per-user resource quantity routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use starledger_shared::requests::{HistoryQuery, UpdateUserResourceRequest};
use starledger_shared::types::{ResourceId, UserId};

use super::{collection, date_range};
use crate::{AppState, error::ApiResult};

/// Creates the user resources router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/userResources/{user_id}",
            get(list_holdings).post(update_quantity),
        )
        .route("/userResources/{user_id}/history", get(get_history))
        .route(
            "/userResources/{user_id}/{resource_id}",
            get(get_holding).put(attach_holding),
        )
}

/// GET `/userResources/{user_id}`
async fn list_holdings(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Response> {
    Ok(collection(state.resources.holdings(user_id).await?))
}

/// POST `/userResources/{user_id}` - Apply a quantity update.
async fn update_quantity(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<UpdateUserResourceRequest>,
) -> ApiResult<Response> {
    let update = state
        .resources
        .apply(
            user_id,
            payload.resource_id,
            payload.quantity,
            payload.update_type,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(update)).into_response())
}

/// GET `/userResources/{user_id}/history`
async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Response> {
    let range = date_range(query)?;
    Ok(collection(state.resources.history(user_id, range).await?))
}

/// GET `/userResources/{user_id}/{resource_id}`
async fn get_holding(
    State(state): State<AppState>,
    Path((user_id, resource_id)): Path<(UserId, ResourceId)>,
) -> ApiResult<Response> {
    Ok(Json(state.resources.holding(user_id, resource_id).await?).into_response())
}

/// PUT `/userResources/{user_id}/{resource_id}` - Start tracking a resource at zero.
async fn attach_holding(
    State(state): State<AppState>,
    Path((user_id, resource_id)): Path<(UserId, ResourceId)>,
) -> ApiResult<Response> {
    let holding = state.resources.attach(user_id, resource_id).await?;
    Ok((StatusCode::CREATED, Json(holding)).into_response())
}
