//! Roles and claims repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{roles, user_claims, user_roles};

/// Identity repository for role and claim grants.
#[derive(Debug, Clone)]
pub struct IdentityRepository {
    db: DatabaseConnection,
}

impl IdentityRepository {
    /// Creates a new identity repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a role by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_role(&self, name: &str) -> Result<Option<roles::Model>, DbErr> {
        roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    /// Creates a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a duplicate name.
    pub async fn create_role(&self, name: &str) -> Result<roles::Model, DbErr> {
        roles::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
        }
        .insert(&self.db)
        .await
    }

    /// Role names granted to a user, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn roles_of(&self, user_id: Uuid) -> Result<Vec<String>, DbErr> {
        let grants = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .find_also_related(roles::Entity)
            .all(&self.db)
            .await?;

        let mut names: Vec<String> = grants
            .into_iter()
            .filter_map(|(_, role)| role.map(|r| r.name))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Grants a role. Already granted roles are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn grant_role(&self, user_id: Uuid, role_id: i32) -> Result<(), DbErr> {
        if user_roles::Entity::find_by_id((user_id, role_id))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Ok(());
        }
        user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Revokes a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn revoke_role(&self, user_id: Uuid, role_id: i32) -> Result<(), DbErr> {
        user_roles::Entity::delete_by_id((user_id, role_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Claims granted to a user, ordered by type then value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn claims_of(&self, user_id: Uuid) -> Result<Vec<user_claims::Model>, DbErr> {
        user_claims::Entity::find()
            .filter(user_claims::Column::UserId.eq(user_id))
            .order_by_asc(user_claims::Column::ClaimType)
            .order_by_asc(user_claims::Column::ClaimValue)
            .all(&self.db)
            .await
    }

    /// Grants a claim. Identical claims are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn add_claim(
        &self,
        user_id: Uuid,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), DbErr> {
        let existing = user_claims::Entity::find()
            .filter(user_claims::Column::UserId.eq(user_id))
            .filter(user_claims::Column::ClaimType.eq(claim_type))
            .filter(user_claims::Column::ClaimValue.eq(claim_value))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }
        user_claims::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            claim_type: Set(claim_type.to_string()),
            claim_value: Set(claim_value.to_string()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Revokes one claim.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn remove_claim(
        &self,
        user_id: Uuid,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), DbErr> {
        user_claims::Entity::delete_many()
            .filter(user_claims::Column::UserId.eq(user_id))
            .filter(user_claims::Column::ClaimType.eq(claim_type))
            .filter(user_claims::Column::ClaimValue.eq(claim_value))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
