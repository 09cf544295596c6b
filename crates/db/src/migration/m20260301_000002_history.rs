//! Daily balance and resource quantity history.
//!
//! The unique indexes hold the one-row-per-subject-per-day invariant; the
//! snapshotter relies on them to detect racing inserts.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BalanceHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BalanceHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BalanceHistory::UserId).uuid().not_null())
                    .col(ColumnDef::new(BalanceHistory::Day).date().not_null())
                    .col(ColumnDef::new(BalanceHistory::Balance).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_balance_history_user")
                            .from(BalanceHistory::Table, BalanceHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_balance_history_user_day")
                    .table(BalanceHistory::Table)
                    .col(BalanceHistory::UserId)
                    .col(BalanceHistory::Day)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ResourceQuantityHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceQuantityHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResourceQuantityHistory::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceQuantityHistory::ResourceId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ResourceQuantityHistory::Day).date().not_null())
                    .col(
                        ColumnDef::new(ResourceQuantityHistory::Quantity)
                            .double()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quantity_history_user")
                            .from(
                                ResourceQuantityHistory::Table,
                                ResourceQuantityHistory::UserId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quantity_history_resource")
                            .from(
                                ResourceQuantityHistory::Table,
                                ResourceQuantityHistory::ResourceId,
                            )
                            .to(Resources::Table, Resources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_quantity_history_user_resource_day")
                    .table(ResourceQuantityHistory::Table)
                    .col(ResourceQuantityHistory::UserId)
                    .col(ResourceQuantityHistory::ResourceId)
                    .col(ResourceQuantityHistory::Day)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResourceQuantityHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BalanceHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BalanceHistory {
    Table,
    Id,
    UserId,
    Day,
    Balance,
}

#[derive(DeriveIden)]
enum ResourceQuantityHistory {
    Table,
    Id,
    UserId,
    ResourceId,
    Day,
    Quantity,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Resources {
    Table,
    Id,
}
