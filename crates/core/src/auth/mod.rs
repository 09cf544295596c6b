//! Claim and role based authorization.
//!
//! Privileged operations name a [`Policy`]. Each policy is one row of
//! [`POLICY_TABLE`] and is checked by [`evaluate`] against anything that
//! exposes [`Capabilities`].

pub mod error;
pub mod policy;
pub mod roles;

#[cfg(test)]
mod policy_props;

pub use error::AuthError;
pub use policy::{
    AuthScheme, Capabilities, POLICY_TABLE, Policy, PolicyRule, Principal, ensure_member_of,
    evaluate,
};
pub use roles::{
    ADMIN_ROLE, DEVELOPER_ROLE, ORGANIZATION_CLAIM, OWNER_ROLE, REQUIRED_ROLES, ensure_roles,
    load_principal,
};
