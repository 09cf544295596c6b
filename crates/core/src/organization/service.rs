//! Organization membership transitions.

use std::sync::Arc;

use starledger_shared::types::{OrganizationId, UserId};
use tracing::info;

use super::error::OrganizationError;
use super::types::OrganizationDetails;
use super::{MAX_NAME_LEN, MIN_NAME_LEN};
use crate::auth::{
    ADMIN_ROLE, Capabilities, ORGANIZATION_CLAIM, OWNER_ROLE, Policy, ensure_member_of, evaluate,
};
use crate::clock::Clock;
use crate::records::{Claim, Membership, Organization, UserAccount};
use crate::store::{IdentityStore, LedgerStore, OrganizationStore};

/// Creates organizations and moves users in and out of them.
pub struct OrganizationService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    revoke_grants_on_removal: bool,
}

impl<S: OrganizationStore + IdentityStore + LedgerStore> OrganizationService<S> {
    /// Creates a service over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            revoke_grants_on_removal: false,
        }
    }

    /// Whether removing a member also revokes their organization claim and
    /// owner/admin roles. Off by default: removal only clears the link and flags.
    #[must_use]
    pub const fn revoke_grants_on_removal(mut self, revoke: bool) -> Self {
        self.revoke_grants_on_removal = revoke;
        self
    }

    async fn organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Organization, OrganizationError> {
        self.store
            .find_organization(organization_id)
            .await?
            .ok_or(OrganizationError::NotFound(organization_id))
    }

    async fn user(&self, user_id: UserId) -> Result<UserAccount, OrganizationError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(OrganizationError::UserNotFound(user_id))
    }

    /// Checks `policy`, that the organization exists, and that the caller's
    /// organization claim covers it.
    async fn authorize<C: Capabilities + ?Sized>(
        &self,
        caller: &C,
        policy: Policy,
        organization_id: OrganizationId,
    ) -> Result<Organization, OrganizationError> {
        evaluate(policy, caller)?;
        let organization = self.organization(organization_id).await?;
        ensure_member_of(caller, organization_id)?;
        Ok(organization)
    }

    /// Users in another organization cannot be pulled in.
    fn ensure_joinable(
        user: &UserAccount,
        organization_id: OrganizationId,
    ) -> Result<(), OrganizationError> {
        match user.organization_id {
            Some(current) if current != organization_id => {
                Err(OrganizationError::AlreadyAffiliated {
                    user_id: user.id,
                    current,
                })
            }
            _ => Ok(()),
        }
    }

    /// Grants the claim for this organization. Claims kept from earlier
    /// memberships do not count.
    async fn ensure_claim(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<(), OrganizationError> {
        let claim = Claim::new(ORGANIZATION_CLAIM, organization_id.to_string());
        let claims = self.store.claims_of(user_id).await?;
        if !claims.contains(&claim) {
            self.store.add_claim(user_id, &claim).await?;
        }
        Ok(())
    }

    async fn details(
        &self,
        organization: Organization,
    ) -> Result<OrganizationDetails, OrganizationError> {
        let members = self.store.members(organization.id).await?;
        Ok(OrganizationDetails {
            organization,
            members,
        })
    }

    /// Every organization, ordered by name.
    pub async fn list(&self) -> Result<Vec<Organization>, OrganizationError> {
        Ok(self.store.list_organizations().await?)
    }

    /// One organization with its members.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
    ) -> Result<OrganizationDetails, OrganizationError> {
        let organization = self.organization(organization_id).await?;
        self.details(organization).await
    }

    /// Creates an organization founded by `founder`.
    ///
    /// The founder becomes owner and admin and receives the `Organization`
    /// claim with the `Owner` and `Admin` roles, all in one store write.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if the name is not 3 to 100 characters
    /// - `UserNotFound` if the founder does not exist
    /// - `AlreadyAffiliated` if the founder belongs to another organization
    /// - `Store(Rejected)` if the roles have not been bootstrapped
    pub async fn create(
        &self,
        founder: UserId,
        name: &str,
    ) -> Result<OrganizationDetails, OrganizationError> {
        let length = name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&length) {
            return Err(OrganizationError::InvalidName);
        }
        let user = self.user(founder).await?;
        if let Some(current) = user.organization_id {
            return Err(OrganizationError::AlreadyAffiliated {
                user_id: founder,
                current,
            });
        }

        let organization = Organization {
            id: OrganizationId::new(),
            name: name.to_string(),
            created_at: self.clock.now(),
        };
        self.store.create_organization(&organization, founder).await?;

        info!(
            organization_id = %organization.id,
            founder = %founder,
            name = %organization.name,
            "Organization created"
        );
        self.details(organization).await
    }

    /// Adds `user_id` to the organization. Adding an existing member succeeds
    /// without changes.
    ///
    /// Requires [`Policy::OrganizationAdmin`] and a matching organization claim.
    pub async fn add_member<C: Capabilities + ?Sized>(
        &self,
        caller: &C,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<OrganizationDetails, OrganizationError> {
        let organization = self
            .authorize(caller, Policy::OrganizationAdmin, organization_id)
            .await?;
        let user = self.user(user_id).await?;
        Self::ensure_joinable(&user, organization_id)?;

        if !user.belongs_to(organization_id) {
            let membership = Membership {
                organization_id: Some(organization_id),
                ..Membership::none()
            };
            self.store.set_membership(user_id, membership).await?;
        }
        self.ensure_claim(user_id, organization_id).await?;

        info!(organization_id = %organization_id, user_id = %user_id, "Member added");
        self.details(organization).await
    }

    /// Makes `user_id` an admin of the organization, adding them as a member
    /// first if needed. Promoting an existing admin succeeds without changes.
    ///
    /// Requires [`Policy::OrganizationOwner`] and a matching organization claim.
    pub async fn promote_admin<C: Capabilities + ?Sized>(
        &self,
        caller: &C,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<OrganizationDetails, OrganizationError> {
        let organization = self
            .authorize(caller, Policy::OrganizationOwner, organization_id)
            .await?;
        let user = self.user(user_id).await?;
        Self::ensure_joinable(&user, organization_id)?;

        if !(user.belongs_to(organization_id) && user.is_admin) {
            let membership = Membership {
                organization_id: Some(organization_id),
                is_owner: user.belongs_to(organization_id) && user.is_owner,
                is_admin: true,
            };
            self.store.set_membership(user_id, membership).await?;
        }
        self.ensure_claim(user_id, organization_id).await?;
        if !self
            .store
            .roles_of(user_id)
            .await?
            .iter()
            .any(|role| role == ADMIN_ROLE)
        {
            self.store.add_role(user_id, ADMIN_ROLE).await?;
        }

        info!(organization_id = %organization_id, user_id = %user_id, "Member promoted to admin");
        self.details(organization).await
    }

    /// Removes `user_id` from the organization, clearing their owner and
    /// admin flags.
    ///
    /// Requires [`Policy::OrganizationAdmin`] and a matching organization claim.
    pub async fn remove_member<C: Capabilities + ?Sized>(
        &self,
        caller: &C,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<(), OrganizationError> {
        self.authorize(caller, Policy::OrganizationAdmin, organization_id)
            .await?;
        let user = self.user(user_id).await?;
        if !user.belongs_to(organization_id) {
            return Err(OrganizationError::NotMember {
                organization_id,
                user_id,
            });
        }

        self.store
            .set_membership(user_id, Membership::none())
            .await?;
        if self.revoke_grants_on_removal {
            self.revoke_grants(user_id, organization_id).await?;
        }

        info!(organization_id = %organization_id, user_id = %user_id, "Member removed");
        Ok(())
    }

    /// Deletes the organization. Members stay, unaffiliated.
    ///
    /// Requires [`Policy::OrganizationOwner`] and a matching organization claim.
    pub async fn delete<C: Capabilities + ?Sized>(
        &self,
        caller: &C,
        organization_id: OrganizationId,
    ) -> Result<(), OrganizationError> {
        self.authorize(caller, Policy::OrganizationOwner, organization_id)
            .await?;
        let members = self.store.members(organization_id).await?;

        self.store.delete_organization(organization_id).await?;
        if self.revoke_grants_on_removal {
            for member in &members {
                self.revoke_grants(member.id, organization_id).await?;
            }
        }

        info!(organization_id = %organization_id, members = members.len(), "Organization deleted");
        Ok(())
    }

    async fn revoke_grants(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<(), OrganizationError> {
        self.store
            .remove_claim(
                user_id,
                &Claim::new(ORGANIZATION_CLAIM, organization_id.to_string()),
            )
            .await?;
        self.store.remove_role(user_id, OWNER_ROLE).await?;
        self.store.remove_role(user_id, ADMIN_ROLE).await?;
        Ok(())
    }
}
