//! Well-known roles and claims, role bootstrap and principal loading.

use std::collections::BTreeSet;

use starledger_shared::types::UserId;
use tracing::info;

use super::policy::{AuthScheme, Principal};
use crate::store::{IdentityStore, StoreResult};

/// Organization owner role.
pub const OWNER_ROLE: &str = "Owner";
/// Organization admin role.
pub const ADMIN_ROLE: &str = "Admin";
/// Catalog maintainer role.
pub const DEVELOPER_ROLE: &str = "Developer";
/// Claim type whose value is the id of the caller's organization.
pub const ORGANIZATION_CLAIM: &str = "Organization";

/// Roles that must exist before any grant is attempted.
pub const REQUIRED_ROLES: [&str; 3] = [OWNER_ROLE, ADMIN_ROLE, DEVELOPER_ROLE];

/// Creates every missing role in [`REQUIRED_ROLES`].
///
/// Safe to call on every startup. Returns the roles that were created.
pub async fn ensure_roles<S: IdentityStore + ?Sized>(store: &S) -> StoreResult<Vec<&'static str>> {
    let mut created = Vec::new();
    for role in REQUIRED_ROLES {
        if !store.role_exists(role).await? {
            store.create_role(role).await?;
            info!(role, "Created missing role");
            created.push(role);
        }
    }
    Ok(created)
}

/// Builds the principal of an authenticated user from their stored grants.
pub async fn load_principal<S: IdentityStore + ?Sized>(
    store: &S,
    user_id: UserId,
    scheme: AuthScheme,
) -> StoreResult<Principal> {
    let roles: BTreeSet<String> = store.roles_of(user_id).await?.into_iter().collect();
    let claims = store.claims_of(user_id).await?;
    Ok(Principal {
        user_id,
        scheme,
        roles,
        claims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Claim;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_ensure_roles_is_idempotent() {
        let store = MemoryStore::new();

        let first = ensure_roles(&store).await.unwrap();
        let second = ensure_roles(&store).await.unwrap();

        assert_eq!(first, REQUIRED_ROLES.to_vec());
        assert!(second.is_empty());
        for role in REQUIRED_ROLES {
            assert!(store.role_exists(role).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_ensure_roles_fills_gaps() {
        let store = MemoryStore::new();
        store.create_role(ADMIN_ROLE).await.unwrap();

        let created = ensure_roles(&store).await.unwrap();

        assert_eq!(created, vec![OWNER_ROLE, DEVELOPER_ROLE]);
    }

    #[tokio::test]
    async fn test_load_principal_collects_grants() {
        let store = MemoryStore::new();
        ensure_roles(&store).await.unwrap();
        let user_id = UserId::new();
        store.add_role(user_id, DEVELOPER_ROLE).await.unwrap();
        store
            .add_claim(user_id, &Claim::new(ORGANIZATION_CLAIM, "abc"))
            .await
            .unwrap();

        let principal = load_principal(&store, user_id, AuthScheme::Bearer)
            .await
            .unwrap();

        assert!(principal.roles.contains(DEVELOPER_ROLE));
        assert_eq!(principal.claims, vec![Claim::new(ORGANIZATION_CLAIM, "abc")]);
    }
}
