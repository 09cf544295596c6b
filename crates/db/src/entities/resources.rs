//! `SeaORM` Entity for resources table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub resource_type: String,
    pub price_buy: f64,
    pub price_sell: f64,
    pub last_updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_resources::Entity")]
    UserResources,
}

impl Related<super::user_resources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserResources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
