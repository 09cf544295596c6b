//! Organization routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use starledger_shared::requests::{CreateOrganizationRequest, HistoryQuery, MemberRequest};
use starledger_shared::types::{OrganizationId, UserId};
use validator::Validate;

use super::{collection, date_range};
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the organizations router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route(
            "/organizations/{org_id}",
            get(get_organization).delete(delete_organization),
        )
        .route("/organizations/{org_id}/user", post(add_user))
        .route("/organizations/{org_id}/user/admin", post(make_admin))
        .route("/organizations/{org_id}/user/{user_id}", delete(remove_user))
        .route("/organizations/{org_id}/balance", get(get_balance))
        .route(
            "/organizations/{org_id}/balance/history",
            get(get_balance_history),
        )
        .route("/organizations/{org_id}/balanceByUser", get(get_balance_by_user))
        .route("/organizations/{org_id}/resources", get(get_resources))
        .route(
            "/organizations/{org_id}/resources/history",
            get(get_resource_history),
        )
        .route(
            "/organizations/{org_id}/resourcesByUser",
            get(get_resources_by_user),
        )
}

/// GET /organizations
async fn list_organizations(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(collection(state.organizations.list().await?))
}

/// POST /organizations - Create an organization.
///
/// The founder is `createdBy` when given, else the caller.
async fn create_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateOrganizationRequest>,
) -> ApiResult<Response> {
    payload.validate()?;
    let founder = payload.created_by.unwrap_or_else(|| auth.user_id());
    let details = state
        .organizations
        .create(founder, &payload.organization_name)
        .await?;
    Ok((StatusCode::CREATED, Json(details)).into_response())
}

/// GET `/organizations/{org_id}`
async fn get_organization(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Response> {
    Ok(Json(state.organizations.get(org_id).await?).into_response())
}

/// DELETE `/organizations/{org_id}` - Owner policy.
async fn delete_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<StatusCode> {
    state.organizations.delete(auth.principal(), org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/organizations/{org_id}/user` - Admin policy.
async fn add_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<MemberRequest>,
) -> ApiResult<Response> {
    let details = state
        .organizations
        .add_member(auth.principal(), org_id, payload.user_id)
        .await?;
    Ok(Json(details).into_response())
}

/// POST `/organizations/{org_id}/user/admin` - Owner policy.
async fn make_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<MemberRequest>,
) -> ApiResult<Response> {
    let details = state
        .organizations
        .promote_admin(auth.principal(), org_id, payload.user_id)
        .await?;
    Ok(Json(details).into_response())
}

/// DELETE `/organizations/{org_id}/user/{user_id}` - Admin policy.
async fn remove_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, user_id)): Path<(OrganizationId, UserId)>,
) -> ApiResult<StatusCode> {
    state
        .organizations
        .remove_member(auth.principal(), org_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/organizations/{org_id}/balance`
async fn get_balance(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Response> {
    Ok(Json(state.aggregator.total_balance(org_id).await?).into_response())
}

/// GET `/organizations/{org_id}/balance/history`
async fn get_balance_history(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Response> {
    let range = date_range(query)?;
    Ok(collection(
        state.aggregator.balance_history(org_id, range).await?,
    ))
}

/// GET `/organizations/{org_id}/balanceByUser`
async fn get_balance_by_user(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Response> {
    Ok(collection(state.aggregator.balance_by_user(org_id).await?))
}

/// GET `/organizations/{org_id}/resources`
async fn get_resources(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Response> {
    Ok(collection(state.aggregator.resources(org_id).await?))
}

/// GET `/organizations/{org_id}/resources/history`
async fn get_resource_history(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Response> {
    let range = date_range(query)?;
    Ok(collection(
        state.aggregator.resource_history(org_id, range).await?,
    ))
}

/// GET `/organizations/{org_id}/resourcesByUser`
async fn get_resources_by_user(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Response> {
    Ok(collection(state.aggregator.resources_by_user(org_id).await?))
}
