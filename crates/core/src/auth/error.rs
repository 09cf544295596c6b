//! Authorization errors.

use starledger_shared::AppError;
use starledger_shared::types::OrganizationId;
use thiserror::Error;

use super::policy::{AuthScheme, Policy};

/// Why a caller was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The caller authenticated with a scheme the policy does not accept.
    #[error("Policy {policy} does not accept {scheme} authentication")]
    SchemeNotAccepted {
        /// Evaluated policy.
        policy: Policy,
        /// Presented scheme.
        scheme: AuthScheme,
    },

    /// A required claim type is absent.
    #[error("Policy {policy} requires the {claim} claim")]
    MissingClaim {
        /// Evaluated policy.
        policy: Policy,
        /// Required claim type.
        claim: &'static str,
    },

    /// A required role is absent.
    #[error("Policy {policy} requires the {role} role")]
    MissingRole {
        /// Evaluated policy.
        policy: Policy,
        /// Required role.
        role: &'static str,
    },

    /// The caller's organization claim does not cover the target organization.
    #[error("Caller is not a member of organization {0}")]
    NotMemberOf(OrganizationId),
}

impl AuthError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SchemeNotAccepted { .. } => "SCHEME_NOT_ACCEPTED",
            Self::MissingClaim { .. } => "MISSING_CLAIM",
            Self::MissingRole { .. } => "MISSING_ROLE",
            Self::NotMemberOf(_) => "NOT_ORGANIZATION_MEMBER",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        403
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::Forbidden(err.to_string())
    }
}
