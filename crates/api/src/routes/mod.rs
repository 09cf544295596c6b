//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use starledger_core::history::{DateRange, InvalidDateRange};
use starledger_shared::requests::HistoryQuery;

use crate::{AppState, middleware::auth_middleware};

pub mod health;
pub mod organizations;
pub mod resources;
pub mod user_resources;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(user_resources::routes())
        .merge(organizations::routes())
        .merge(resources::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// 200 with the items, or 204 when there are none.
pub(crate) fn collection<T: Serialize>(items: Vec<T>) -> Response {
    if items.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(items).into_response()
    }
}

/// Inclusive day range from optional `startDate` / `endDate` parameters.
pub(crate) fn date_range(query: HistoryQuery) -> Result<DateRange, InvalidDateRange> {
    DateRange::new(query.start_date, query.end_date)
}
