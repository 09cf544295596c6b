//! Organization repository for database operations.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{organizations, roles, user_claims, user_roles, users};

/// Organization repository.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists all organizations ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<organizations::Model>, DbErr> {
        organizations::Entity::find()
            .order_by_asc(organizations::Column::Name)
            .order_by_asc(organizations::Column::Id)
            .all(&self.db)
            .await
    }

    /// Creates an organization and makes `founder` its owner and admin in one
    /// transaction: links the founder, grants `claim` and every role in `roles`.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::RecordNotFound` if the founder or a role is missing,
    /// or any database error. Nothing is written on error.
    pub async fn create_with_founder(
        &self,
        organization: organizations::Model,
        founder: Uuid,
        claim: (&str, &str),
        roles: &[&str],
    ) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;

        if users::Entity::find_by_id(founder).one(&txn).await?.is_none() {
            return Err(DbErr::RecordNotFound(format!("User {founder} does not exist")));
        }

        let mut role_ids = Vec::with_capacity(roles.len());
        for name in roles {
            let role = roles::Entity::find()
                .filter(roles::Column::Name.eq(*name))
                .one(&txn)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(format!("Role {name} does not exist")))?;
            role_ids.push(role.id);
        }

        let organization_id = organization.id;
        organizations::ActiveModel {
            id: Set(organization.id),
            name: Set(organization.name),
            created_at: Set(organization.created_at),
        }
        .insert(&txn)
        .await?;

        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        users::Entity::update_many()
            .col_expr(users::Column::OrganizationId, Expr::value(organization_id))
            .col_expr(users::Column::IsOwner, Expr::value(true))
            .col_expr(users::Column::IsAdmin, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(founder))
            .exec(&txn)
            .await?;

        let (claim_type, claim_value) = claim;
        user_claims::ActiveModel {
            user_id: Set(founder),
            claim_type: Set(claim_type.to_string()),
            claim_value: Set(claim_value.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for role_id in role_ids {
            let granted = user_roles::Entity::find_by_id((founder, role_id))
                .one(&txn)
                .await?;
            if granted.is_none() {
                user_roles::ActiveModel {
                    user_id: Set(founder),
                    role_id: Set(role_id),
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await
    }

    /// Deletes an organization, unlinking its members and clearing their flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        users::Entity::update_many()
            .col_expr(users::Column::OrganizationId, Expr::value(Option::<Uuid>::None))
            .col_expr(users::Column::IsOwner, Expr::value(false))
            .col_expr(users::Column::IsAdmin, Expr::value(false))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::OrganizationId.eq(id))
            .exec(&txn)
            .await?;

        let result = organizations::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}
