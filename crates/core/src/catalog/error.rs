//! Catalog error types.

use starledger_shared::types::ResourceId;
use starledger_shared::{AppError, FieldErrors};
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Resource does not exist.
    #[error("Resource with ID {0} was not found")]
    NotFound(ResourceId),

    /// One or more entries failed validation; nothing was written.
    #[error("Invalid catalog entries")]
    Invalid(FieldErrors),

    /// Caller may not edit the catalog.
    #[error(transparent)]
    Forbidden(#[from] AuthError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "RESOURCE_NOT_FOUND",
            Self::Invalid(_) => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Store(StoreError::Conflict(_)) => "CONFLICT",
            Self::Store(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Invalid(_) => 400,
            Self::Forbidden(_) => 403,
            Self::Store(StoreError::Conflict(_)) => 409,
            Self::Store(_) => 500,
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => Self::NotFound(err.to_string()),
            CatalogError::Invalid(errors) => Self::ValidationFailed(errors),
            CatalogError::Forbidden(auth) => auth.into(),
            CatalogError::Store(store) => store.into(),
        }
    }
}
