// ABOUTME: Reference table entity: Database engine kinds (ORACLE, POSTGRES, ...) used to classify databases
// ABOUTME: Rows are seeded on first run and only ever created or deleted afterwards

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "database_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub description: String,
    pub creation_date: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::database::Entity")]
    Databases,
}

impl Related<super::database::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Databases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
