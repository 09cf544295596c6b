//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use starledger_core::StoreError;
use starledger_core::catalog::CatalogError;
use starledger_core::history::InvalidDateRange;
use starledger_core::ledger::LedgerError;
use starledger_core::organization::OrganizationError;
use starledger_core::users::UserError;
use starledger_shared::{AppError, FieldErrors};
use tracing::{debug, error};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AppError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            error: self.0.error_code(),
            message: self.0.public_message(),
            errors: match self.0 {
                AppError::ValidationFailed(errors) => Some(errors),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}

macro_rules! into_api_error {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for ApiError {
                fn from(err: $source) -> Self {
                    Self(AppError::from(err))
                }
            }
        )*
    };
}

into_api_error!(
    AppError,
    StoreError,
    LedgerError,
    OrganizationError,
    CatalogError,
    UserError,
    InvalidDateRange,
    validator::ValidationErrors,
);

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = ApiError(AppError::NotFound("User 42 was not found".into())).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["message"], "User 42 was not found");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_carries_field_map() {
        let response = ApiError(AppError::field("organizationName", "too short")).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["organizationName"][0], "too short");
    }

    #[tokio::test]
    async fn test_database_error_is_opaque() {
        let response = ApiError::from(StoreError::Backend("socket closed".into())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "An error occurred");
    }
}
