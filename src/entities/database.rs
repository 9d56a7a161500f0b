// ABOUTME: Database entity describing a reachable database instance
// ABOUTME: Classified by database type (engine)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "database")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    pub host: String,
    pub port: i32,
    pub sid: String,
    pub database_type_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::database_type::Entity",
        from = "Column::DatabaseTypeId",
        to = "super::database_type::Column::Id"
    )]
    DatabaseType,
}

impl Related<super::database_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DatabaseType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
