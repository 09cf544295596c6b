//! User profile and balance routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use starledger_core::records::NewUser;
use starledger_shared::requests::{
    HistoryQuery, RegisterUserRequest, UpdateBalanceRequest, UpdateUserRequest,
};
use starledger_shared::types::UserId;
use tracing::info;
use validator::Validate;

use super::{collection, date_range};
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Current balance of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    /// User.
    pub user_id: UserId,
    /// Balance.
    pub balance: i64,
}

/// Creates the users router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register_user))
        .route("/users/claims", get(get_claims))
        .route(
            "/users/{user_id}",
            get(get_user).post(update_user).delete(delete_user),
        )
        .route("/users/{user_id}/balance", get(get_balance))
        .route(
            "/users/{user_id}/balance/history",
            get(get_balance_history).post(update_balance),
        )
}

/// GET /users
async fn list_users(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(collection(state.users.list().await?))
}

/// POST /users - Register the caller's own profile.
async fn register_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RegisterUserRequest>,
) -> ApiResult<Response> {
    payload.validate()?;
    let user = state
        .users
        .register(NewUser {
            id: auth.user_id(),
            email: payload.email,
            handle: payload.handle,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// GET /users/claims
async fn get_claims(State(state): State<AppState>, auth: AuthUser) -> Response {
    collection(state.users.claims(auth.principal()))
}

/// GET `/users/{user_id}`
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Response> {
    Ok(Json(state.users.get(user_id).await?).into_response())
}

/// POST `/users/{user_id}` - Update profile fields.
async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Response> {
    payload.validate()?;
    let user = state
        .users
        .update(user_id, payload.email, payload.handle)
        .await?;
    Ok(Json(user).into_response())
}

/// DELETE `/users/{user_id}`
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<StatusCode> {
    state.users.delete(user_id).await?;
    info!(user_id = %user_id, deleted_by = %auth.user_id(), "User removed via API");
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/users/{user_id}/balance`
async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = state.balances.balance(user_id).await?;
    Ok(Json(BalanceResponse { user_id, balance }))
}

/// GET `/users/{user_id}/balance/history`
async fn get_balance_history(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Response> {
    let range = date_range(query)?;
    Ok(collection(state.balances.history(user_id, range).await?))
}

/// POST `/users/{user_id}/balance/history` - Apply a balance update.
async fn update_balance(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<UpdateBalanceRequest>,
) -> ApiResult<Response> {
    let update = state
        .balances
        .apply(user_id, payload.update_amount, payload.update_type)
        .await?;
    Ok((StatusCode::CREATED, Json(update)).into_response())
}
