//! Resource catalog repository.

use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::resources;

/// Catalog columns written by an upsert.
#[derive(Debug, Clone)]
pub struct ResourceValues<'a> {
    /// Natural key.
    pub code: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Category.
    pub resource_type: &'a str,
    /// Buy price.
    pub price_buy: f64,
    /// Sell price.
    pub price_sell: f64,
}

/// Resource catalog repository.
#[derive(Debug, Clone)]
pub struct ResourceRepository {
    db: DatabaseConnection,
}

impl ResourceRepository {
    /// Creates a new resource repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the catalog ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<resources::Model>, DbErr> {
        resources::Entity::find()
            .order_by_asc(resources::Column::Id)
            .all(&self.db)
            .await
    }

    /// Finds a resource by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<resources::Model>, DbErr> {
        resources::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a resource by its code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<resources::Model>, DbErr> {
        resources::Entity::find()
            .filter(resources::Column::Code.eq(code))
            .one(&self.db)
            .await
    }

    /// Inserts a catalog row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a duplicate code.
    pub async fn insert(
        &self,
        values: &ResourceValues<'_>,
        now: DateTimeWithTimeZone,
    ) -> Result<resources::Model, DbErr> {
        resources::ActiveModel {
            id: NotSet,
            code: Set(values.code.to_string()),
            name: Set(values.name.to_string()),
            resource_type: Set(values.resource_type.to_string()),
            price_buy: Set(values.price_buy),
            price_sell: Set(values.price_sell),
            last_updated: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Overwrites the name, type and prices of a catalog row.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::RecordNotFound` if the row vanished, or any database error.
    pub async fn update(
        &self,
        id: i32,
        values: &ResourceValues<'_>,
        now: DateTimeWithTimeZone,
    ) -> Result<resources::Model, DbErr> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Resource {id} does not exist")))?;

        let mut active: resources::ActiveModel = existing.into();
        active.name = Set(values.name.to_string());
        active.resource_type = Set(values.resource_type.to_string());
        active.price_buy = Set(values.price_buy);
        active.price_sell = Set(values.price_sell);
        active.last_updated = Set(now);
        active.update(&self.db).await
    }
}
