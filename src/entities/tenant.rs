use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An organizational account that can own stocking events and employ users.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub registry_code: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::person::Entity")]
    Person,
    #[sea_orm(has_many = "super::stocking_event::Entity")]
    StockingEvent,
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Person.def()
    }
}

impl Related<super::stocking_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockingEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
