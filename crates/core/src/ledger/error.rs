//! Ledger error types.

use starledger_shared::AppError;
use starledger_shared::types::{ResourceId, UserId};
use thiserror::Error;

use crate::history::InvalidDateRange;
use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Lookup Errors ==========
    /// User does not exist.
    #[error("User with ID {0} was not found")]
    UserNotFound(UserId),

    /// Resource does not exist in the catalog.
    #[error("Resource with ID {0} was not found")]
    ResourceNotFound(ResourceId),

    /// User does not hold the resource.
    #[error("User {user_id} does not hold resource {resource_id}")]
    HoldingNotFound {
        /// Holder.
        user_id: UserId,
        /// Resource.
        resource_id: ResourceId,
    },

    // ========== Invalid Operations ==========
    /// Update would leave the balance below zero.
    #[error("Balance {balance} of user {user_id} cannot cover {requested}")]
    NegativeBalance {
        /// Subject.
        user_id: UserId,
        /// Balance before the update.
        balance: i64,
        /// Requested amount.
        requested: i64,
    },

    /// Update would leave the quantity below zero.
    #[error("Quantity {available} of resource {resource_id} cannot cover {requested}")]
    InsufficientQuantity {
        /// Resource.
        resource_id: ResourceId,
        /// Quantity before the update.
        available: f64,
        /// Requested quantity.
        requested: f64,
    },

    /// Add or subtract of a negative amount.
    #[error("Update amount cannot be negative")]
    NegativeAmount,

    /// NaN or infinite quantity.
    #[error("Quantity must be a finite number")]
    InvalidQuantity,

    /// Balance would overflow.
    #[error("Balance update overflows")]
    Overflow,

    // ========== Range Errors ==========
    /// History range start after end.
    #[error(transparent)]
    InvalidRange(#[from] InvalidDateRange),

    // ========== Concurrency & Storage ==========
    /// Lost every compare-and-swap attempt.
    #[error("{subject} was modified concurrently, giving up after {attempts} attempts")]
    ConcurrentModification {
        /// Description of the contended subject.
        subject: String,
        /// Attempts made.
        attempts: u32,
    },

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            Self::HoldingNotFound { .. } => "HOLDING_NOT_FOUND",
            Self::NegativeBalance { .. } => "NEGATIVE_BALANCE",
            Self::InsufficientQuantity { .. } => "INSUFFICIENT_QUANTITY",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::Overflow => "OVERFLOW",
            Self::InvalidRange(_) => "INVALID_DATE_RANGE",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::Store(StoreError::Conflict(_)) => "CONFLICT",
            Self::Store(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound(_) | Self::ResourceNotFound(_) | Self::HoldingNotFound { .. } => {
                404
            }
            Self::NegativeBalance { .. }
            | Self::InsufficientQuantity { .. }
            | Self::NegativeAmount
            | Self::InvalidQuantity
            | Self::Overflow => 422,
            Self::InvalidRange(_) => 400,
            Self::ConcurrentModification { .. } | Self::Store(StoreError::Conflict(_)) => 409,
            Self::Store(_) => 500,
        }
    }

    /// Whether the operation was refused without touching state.
    #[must_use]
    pub const fn is_invalid_operation(&self) -> bool {
        self.http_status_code() == 422
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UserNotFound(_)
            | LedgerError::ResourceNotFound(_)
            | LedgerError::HoldingNotFound { .. } => Self::NotFound(err.to_string()),
            LedgerError::NegativeBalance { .. }
            | LedgerError::InsufficientQuantity { .. }
            | LedgerError::NegativeAmount
            | LedgerError::InvalidQuantity
            | LedgerError::Overflow => Self::BusinessRule(err.to_string()),
            LedgerError::InvalidRange(_) => Self::Validation(err.to_string()),
            LedgerError::ConcurrentModification { .. } => Self::Conflict(err.to_string()),
            LedgerError::Store(store) => store.into(),
        }
    }
}
