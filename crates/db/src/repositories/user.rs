//! User repository for database operations.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::users;

/// User repository for CRUD operations and balance writes.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists all users ordered by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .order_by_asc(users::Column::Email)
            .all(&self.db)
            .await
    }

    /// Creates a new user with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails, including duplicate id or email.
    pub async fn create(
        &self,
        id: Uuid,
        email: &str,
        handle: Option<&str>,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(id),
            email: Set(email.to_string()),
            handle: Set(handle.map(ToString::to_string)),
            balance: Set(0),
            organization_id: Set(None),
            is_owner: Set(false),
            is_admin: Set(false),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Updates the given profile fields.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_profile(
        &self,
        id: Uuid,
        email: Option<String>,
        handle: Option<String>,
    ) -> Result<Option<users::Model>, DbErr> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(handle) = handle {
            active.handle = Set(Some(handle));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await.map(Some)
    }

    /// Deletes a user. Holdings, history, roles and claims cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = users::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Writes `balance` if the row still carries `expected_version`, bumping the version.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn compare_and_set_balance(
        &self,
        id: Uuid,
        expected_version: i64,
        balance: i64,
    ) -> Result<bool, DbErr> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let result = users::Entity::update_many()
            .col_expr(users::Column::Balance, Expr::value(balance))
            .col_expr(
                users::Column::Version,
                Expr::col(users::Column::Version).add(1),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Replaces a user's organization link and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_membership(
        &self,
        id: Uuid,
        organization_id: Option<Uuid>,
        is_owner: bool,
        is_admin: bool,
    ) -> Result<bool, DbErr> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let result = users::Entity::update_many()
            .col_expr(users::Column::OrganizationId, Expr::value(organization_id))
            .col_expr(users::Column::IsOwner, Expr::value(is_owner))
            .col_expr(users::Column::IsAdmin, Expr::value(is_admin))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Lists the members of an organization ordered by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn members(&self, organization_id: Uuid) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::OrganizationId.eq(organization_id))
            .order_by_asc(users::Column::Email)
            .all(&self.db)
            .await
    }
}
