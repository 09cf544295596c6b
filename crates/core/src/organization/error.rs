//! Organization error types.

use starledger_shared::types::{OrganizationId, UserId};
use starledger_shared::{AppError, FieldErrors};
use thiserror::Error;

use crate::auth::AuthError;
use crate::history::InvalidDateRange;
use crate::store::StoreError;

/// Errors from organization management and rollups.
#[derive(Debug, Error)]
pub enum OrganizationError {
    /// Organization does not exist.
    #[error("Organization with ID {0} was not found")]
    NotFound(OrganizationId),

    /// User does not exist.
    #[error("User with ID {0} was not found")]
    UserNotFound(UserId),

    /// User is not a member of the organization.
    #[error("User {user_id} is not a member of organization {organization_id}")]
    NotMember {
        /// Organization.
        organization_id: OrganizationId,
        /// User.
        user_id: UserId,
    },

    /// User already belongs to another organization.
    #[error("User {user_id} already belongs to organization {current}")]
    AlreadyAffiliated {
        /// User.
        user_id: UserId,
        /// Organization the user belongs to.
        current: OrganizationId,
    },

    /// Name outside 3 to 100 characters.
    #[error("Organization name must be between 3 and 100 characters")]
    InvalidName,

    /// Caller may not perform the operation.
    #[error(transparent)]
    Forbidden(#[from] AuthError),

    /// History range start after end.
    #[error(transparent)]
    InvalidRange(#[from] InvalidDateRange),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrganizationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ORGANIZATION_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::NotMember { .. } => "NOT_A_MEMBER",
            Self::AlreadyAffiliated { .. } => "ALREADY_AFFILIATED",
            Self::InvalidName => "INVALID_NAME",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidRange(_) => "INVALID_DATE_RANGE",
            Self::Store(StoreError::Rejected { .. }) => "GRANT_REJECTED",
            Self::Store(StoreError::Conflict(_)) => "CONFLICT",
            Self::Store(StoreError::Backend(_)) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::UserNotFound(_) | Self::NotMember { .. } => 404,
            Self::AlreadyAffiliated { .. } | Self::Store(StoreError::Conflict(_)) => 409,
            Self::InvalidName | Self::InvalidRange(_) | Self::Store(StoreError::Rejected { .. }) => {
                400
            }
            Self::Forbidden(_) => 403,
            Self::Store(StoreError::Backend(_)) => 500,
        }
    }
}

impl From<OrganizationError> for AppError {
    fn from(err: OrganizationError) -> Self {
        match err {
            OrganizationError::NotFound(_)
            | OrganizationError::UserNotFound(_)
            | OrganizationError::NotMember { .. } => Self::NotFound(err.to_string()),
            OrganizationError::AlreadyAffiliated { .. } => Self::Conflict(err.to_string()),
            OrganizationError::InvalidName => {
                let mut errors = FieldErrors::new();
                errors.insert("organizationName".to_string(), vec![err.to_string()]);
                Self::ValidationFailed(errors)
            }
            OrganizationError::Forbidden(auth) => auth.into(),
            OrganizationError::InvalidRange(range) => range.into(),
            OrganizationError::Store(store) => store.into(),
        }
    }
}
