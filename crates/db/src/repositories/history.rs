//! History repository for daily balance and quantity snapshots.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{balance_history, resource_quantity_history};

/// Optional inclusive day bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayBounds {
    /// Earliest day, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest day, inclusive.
    pub to: Option<NaiveDate>,
}

/// History repository.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    /// Creates a new history repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Balance history
    // ========================================================================

    /// Finds the balance row of a user for a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_balance(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<Option<balance_history::Model>, DbErr> {
        balance_history::Entity::find()
            .filter(balance_history::Column::UserId.eq(user_id))
            .filter(balance_history::Column::Day.eq(day))
            .one(&self.db)
            .await
    }

    /// Inserts a balance row.
    ///
    /// # Errors
    ///
    /// Returns a unique violation if the day already has a row.
    pub async fn insert_balance(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        balance: i64,
    ) -> Result<balance_history::Model, DbErr> {
        balance_history::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            day: Set(day),
            balance: Set(balance),
        }
        .insert(&self.db)
        .await
    }

    /// Overwrites the value of a balance row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the update fails.
    pub async fn update_balance(
        &self,
        id: i64,
        balance: i64,
    ) -> Result<balance_history::Model, DbErr> {
        balance_history::ActiveModel {
            id: Set(id),
            balance: Set(balance),
            ..Default::default()
        }
        .update(&self.db)
        .await
    }

    /// Balance rows of the given users within the bounds, ordered by day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_range(
        &self,
        user_ids: &[Uuid],
        bounds: DayBounds,
    ) -> Result<Vec<balance_history::Model>, DbErr> {
        let mut condition =
            Condition::all().add(balance_history::Column::UserId.is_in(user_ids.iter().copied()));
        if let Some(from) = bounds.from {
            condition = condition.add(balance_history::Column::Day.gte(from));
        }
        if let Some(to) = bounds.to {
            condition = condition.add(balance_history::Column::Day.lte(to));
        }

        balance_history::Entity::find()
            .filter(condition)
            .order_by_asc(balance_history::Column::Day)
            .order_by_asc(balance_history::Column::Id)
            .all(&self.db)
            .await
    }

    // ========================================================================
    // Resource quantity history
    // ========================================================================

    /// Finds the quantity row of a holding for a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_quantity(
        &self,
        user_id: Uuid,
        resource_id: i32,
        day: NaiveDate,
    ) -> Result<Option<resource_quantity_history::Model>, DbErr> {
        resource_quantity_history::Entity::find()
            .filter(resource_quantity_history::Column::UserId.eq(user_id))
            .filter(resource_quantity_history::Column::ResourceId.eq(resource_id))
            .filter(resource_quantity_history::Column::Day.eq(day))
            .one(&self.db)
            .await
    }

    /// Inserts a quantity row.
    ///
    /// # Errors
    ///
    /// Returns a unique violation if the day already has a row.
    pub async fn insert_quantity(
        &self,
        user_id: Uuid,
        resource_id: i32,
        day: NaiveDate,
        quantity: f64,
    ) -> Result<resource_quantity_history::Model, DbErr> {
        resource_quantity_history::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            resource_id: Set(resource_id),
            day: Set(day),
            quantity: Set(quantity),
        }
        .insert(&self.db)
        .await
    }

    /// Overwrites the value of a quantity row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the update fails.
    pub async fn update_quantity(
        &self,
        id: i64,
        quantity: f64,
    ) -> Result<resource_quantity_history::Model, DbErr> {
        resource_quantity_history::ActiveModel {
            id: Set(id),
            quantity: Set(quantity),
            ..Default::default()
        }
        .update(&self.db)
        .await
    }

    /// Quantity rows of the given users within the bounds, ordered by day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn quantity_range(
        &self,
        user_ids: &[Uuid],
        bounds: DayBounds,
    ) -> Result<Vec<resource_quantity_history::Model>, DbErr> {
        let mut condition = Condition::all().add(
            resource_quantity_history::Column::UserId.is_in(user_ids.iter().copied()),
        );
        if let Some(from) = bounds.from {
            condition = condition.add(resource_quantity_history::Column::Day.gte(from));
        }
        if let Some(to) = bounds.to {
            condition = condition.add(resource_quantity_history::Column::Day.lte(to));
        }

        resource_quantity_history::Entity::find()
            .filter(condition)
            .order_by_asc(resource_quantity_history::Column::Day)
            .order_by_asc(resource_quantity_history::Column::Id)
            .all(&self.db)
            .await
    }
}
