//! Holding (user resource) repository.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::user_resources;

/// Repository for per-user resource quantities.
#[derive(Debug, Clone)]
pub struct HoldingRepository {
    db: DatabaseConnection,
}

impl HoldingRepository {
    /// Creates a new holding repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds one holding.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        user_id: Uuid,
        resource_id: i32,
    ) -> Result<Option<user_resources::Model>, DbErr> {
        user_resources::Entity::find_by_id((user_id, resource_id))
            .one(&self.db)
            .await
    }

    /// Lists the holdings of the given users ordered by user then resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<user_resources::Model>, DbErr> {
        user_resources::Entity::find()
            .filter(user_resources::Column::UserId.is_in(user_ids.iter().copied()))
            .order_by_asc(user_resources::Column::UserId)
            .order_by_asc(user_resources::Column::ResourceId)
            .all(&self.db)
            .await
    }

    /// Creates an empty holding, or returns the existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails for any reason other than a
    /// concurrent attach of the same pair.
    pub async fn attach(
        &self,
        user_id: Uuid,
        resource_id: i32,
    ) -> Result<user_resources::Model, DbErr> {
        if let Some(existing) = self.find(user_id, resource_id).await? {
            return Ok(existing);
        }

        let inserted = user_resources::ActiveModel {
            user_id: Set(user_id),
            resource_id: Set(resource_id),
            quantity: Set(0.0),
            version: Set(0),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .find(user_id, resource_id)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound("holding vanished after attach".into())),
            other => other,
        }
    }

    /// Writes `quantity` if the row still carries `expected_version`, bumping the version.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn compare_and_set_quantity(
        &self,
        user_id: Uuid,
        resource_id: i32,
        expected_version: i64,
        quantity: f64,
    ) -> Result<bool, DbErr> {
        let result = user_resources::Entity::update_many()
            .col_expr(user_resources::Column::Quantity, Expr::value(quantity))
            .col_expr(
                user_resources::Column::Version,
                Expr::col(user_resources::Column::Version).add(1),
            )
            .filter(user_resources::Column::UserId.eq(user_id))
            .filter(user_resources::Column::ResourceId.eq(resource_id))
            .filter(user_resources::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
