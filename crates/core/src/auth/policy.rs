//! Policy table and evaluation.

use std::collections::BTreeSet;

use serde::Serialize;
use starledger_shared::types::{OrganizationId, UserId};

use super::error::AuthError;
use super::roles::{ADMIN_ROLE, DEVELOPER_ROLE, ORGANIZATION_CLAIM, OWNER_ROLE};
use crate::records::Claim;

/// How the caller presented their token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuthScheme {
    /// `Authorization: Bearer` header.
    Bearer,
    /// Session cookie.
    Cookie,
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer => write!(f, "bearer"),
            Self::Cookie => write!(f, "cookie"),
        }
    }
}

/// Named authorization policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Organization admins.
    OrganizationAdmin,
    /// Organization owners.
    OrganizationOwner,
    /// Catalog maintainers.
    Developer,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrganizationAdmin => write!(f, "OrganizationAdmin"),
            Self::OrganizationOwner => write!(f, "OrganizationOwner"),
            Self::Developer => write!(f, "Developer"),
        }
    }
}

/// Requirements of one policy.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRule {
    /// Policy this row defines.
    pub policy: Policy,
    /// Accepted authentication schemes.
    pub schemes: &'static [AuthScheme],
    /// Claim type that must be present, with any value.
    pub claim: Option<&'static str>,
    /// Role that must be granted.
    pub role: Option<&'static str>,
}

const ANY_SCHEME: &[AuthScheme] = &[AuthScheme::Bearer, AuthScheme::Cookie];

const ORGANIZATION_ADMIN: PolicyRule = PolicyRule {
    policy: Policy::OrganizationAdmin,
    schemes: ANY_SCHEME,
    claim: Some(ORGANIZATION_CLAIM),
    role: Some(ADMIN_ROLE),
};

const ORGANIZATION_OWNER: PolicyRule = PolicyRule {
    policy: Policy::OrganizationOwner,
    schemes: ANY_SCHEME,
    claim: Some(ORGANIZATION_CLAIM),
    role: Some(OWNER_ROLE),
};

const DEVELOPER: PolicyRule = PolicyRule {
    policy: Policy::Developer,
    schemes: ANY_SCHEME,
    claim: None,
    role: Some(DEVELOPER_ROLE),
};

/// Every policy the service knows.
pub const POLICY_TABLE: &[PolicyRule] = &[ORGANIZATION_ADMIN, ORGANIZATION_OWNER, DEVELOPER];

impl Policy {
    /// Table row for this policy.
    #[must_use]
    pub const fn rule(self) -> &'static PolicyRule {
        match self {
            Self::OrganizationAdmin => &ORGANIZATION_ADMIN,
            Self::OrganizationOwner => &ORGANIZATION_OWNER,
            Self::Developer => &DEVELOPER,
        }
    }
}

/// What a caller can prove about themselves.
pub trait Capabilities {
    /// Scheme the caller authenticated with.
    fn scheme(&self) -> AuthScheme;

    /// Whether `role` is granted.
    fn has_role(&self, role: &str) -> bool;

    /// Values of every claim of `claim_type`.
    fn claim_values(&self, claim_type: &str) -> Vec<&str>;

    /// Whether any claim of `claim_type` is present.
    fn has_claim(&self, claim_type: &str) -> bool {
        !self.claim_values(claim_type).is_empty()
    }
}

/// Authenticated caller with their grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Authenticated user.
    pub user_id: UserId,
    /// Presented scheme.
    pub scheme: AuthScheme,
    /// Granted roles.
    pub roles: BTreeSet<String>,
    /// Granted claims.
    pub claims: Vec<Claim>,
}

impl Principal {
    /// Caller with no grants.
    #[must_use]
    pub fn new(user_id: UserId, scheme: AuthScheme) -> Self {
        Self {
            user_id,
            scheme,
            roles: BTreeSet::new(),
            claims: Vec::new(),
        }
    }

    /// Adds a role.
    #[must_use]
    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_string());
        self
    }

    /// Adds a claim.
    #[must_use]
    pub fn with_claim(mut self, claim_type: &str, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }
}

impl Capabilities for Principal {
    fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    fn claim_values(&self, claim_type: &str) -> Vec<&str> {
        self.claims
            .iter()
            .filter(|claim| claim.claim_type == claim_type)
            .map(|claim| claim.value.as_str())
            .collect()
    }
}

/// Checks `subject` against the table row of `policy`.
pub fn evaluate<C: Capabilities + ?Sized>(policy: Policy, subject: &C) -> Result<(), AuthError> {
    let rule = policy.rule();

    if !rule.schemes.contains(&subject.scheme()) {
        return Err(AuthError::SchemeNotAccepted {
            policy,
            scheme: subject.scheme(),
        });
    }
    if let Some(claim) = rule.claim
        && !subject.has_claim(claim)
    {
        return Err(AuthError::MissingClaim { policy, claim });
    }
    if let Some(role) = rule.role
        && !subject.has_role(role)
    {
        return Err(AuthError::MissingRole { policy, role });
    }
    Ok(())
}

/// Checks that the caller's `Organization` claims include `organization_id`.
pub fn ensure_member_of<C: Capabilities + ?Sized>(
    subject: &C,
    organization_id: OrganizationId,
) -> Result<(), AuthError> {
    let target = organization_id.to_string();
    if subject
        .claim_values(ORGANIZATION_CLAIM)
        .iter()
        .any(|value| value.eq_ignore_ascii_case(&target))
    {
        Ok(())
    } else {
        Err(AuthError::NotMemberOf(organization_id))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn admin_of(organization_id: OrganizationId) -> Principal {
        Principal::new(UserId::new(), AuthScheme::Bearer)
            .with_role(ADMIN_ROLE)
            .with_claim(ORGANIZATION_CLAIM, organization_id.to_string())
    }

    #[test]
    fn test_every_policy_has_a_row() {
        for policy in [
            Policy::OrganizationAdmin,
            Policy::OrganizationOwner,
            Policy::Developer,
        ] {
            assert_eq!(policy.rule().policy, policy);
            assert!(POLICY_TABLE.iter().any(|rule| rule.policy == policy));
        }
    }

    #[rstest]
    #[case(Policy::OrganizationAdmin, true)]
    #[case(Policy::OrganizationOwner, false)]
    #[case(Policy::Developer, false)]
    fn test_admin_principal(#[case] policy: Policy, #[case] allowed: bool) {
        let principal = admin_of(OrganizationId::new());
        assert_eq!(evaluate(policy, &principal).is_ok(), allowed);
    }

    #[test]
    fn test_role_without_claim_is_refused() {
        let principal = Principal::new(UserId::new(), AuthScheme::Cookie).with_role(OWNER_ROLE);
        assert_eq!(
            evaluate(Policy::OrganizationOwner, &principal),
            Err(AuthError::MissingClaim {
                policy: Policy::OrganizationOwner,
                claim: ORGANIZATION_CLAIM,
            })
        );
    }

    #[test]
    fn test_developer_needs_no_claim() {
        let principal = Principal::new(UserId::new(), AuthScheme::Cookie).with_role(DEVELOPER_ROLE);
        assert!(evaluate(Policy::Developer, &principal).is_ok());
    }

    #[test]
    fn test_membership_claim_must_match_target() {
        let organization_id = OrganizationId::new();
        let principal = admin_of(organization_id);

        assert!(ensure_member_of(&principal, organization_id).is_ok());
        let other = OrganizationId::new();
        assert_eq!(
            ensure_member_of(&principal, other),
            Err(AuthError::NotMemberOf(other))
        );
    }
}
