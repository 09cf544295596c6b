//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use starledger_core::auth::{AuthScheme, Principal, load_principal};
use starledger_shared::{AppError, JwtError};
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Finds the access token and how it was presented. The header wins over the cookie.
fn extract_token(request: &Request, cookie_name: &str) -> Option<(String, AuthScheme)> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);
    if let Some(token) = header {
        return Some((token.to_string(), AuthScheme::Bearer));
    }

    CookieJar::from_headers(request.headers())
        .get(cookie_name)
        .map(|cookie| (cookie.value().to_string(), AuthScheme::Cookie))
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Takes the token from the `Authorization: Bearer` header or the auth cookie
/// 2. Validates the token using the JWT service
/// 3. Loads the caller's roles and claims and stores the [`Principal`] in
///    request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some((token, scheme)) = extract_token(&request, &state.cookie_name) else {
        return ApiError(AppError::Unauthorized(
            "A bearer token or auth cookie is required".into(),
        ))
        .into_response();
    };

    let claims = match state.jwt_service.validate_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, %scheme, "Token rejected");
            let message = match e {
                JwtError::Expired => "Token has expired",
                _ => "Invalid or malformed token",
            };
            return ApiError(AppError::Unauthorized(message.into())).into_response();
        }
    };

    match load_principal(&*state.store, claims.user_id(), scheme).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the authenticated caller.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    /// Returns the caller's user ID.
    #[must_use]
    pub const fn user_id(&self) -> starledger_shared::types::UserId {
        self.0.user_id
    }

    /// Returns the caller's principal.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError(AppError::Unauthorized("Authentication required".into())))
    }
}
