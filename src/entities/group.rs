// ABOUTME: Group entity: a named role that users join and permissions are granted to
// ABOUTME: Descriptions are unique; deleting a group leaves its link rows in place

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub description: String,
    pub creation_date: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_group::Entity")]
    Members,
    #[sea_orm(has_many = "super::function_permission::Entity")]
    FunctionPermissions,
    #[sea_orm(has_many = "super::server_permission::Entity")]
    ServerPermissions,
}

impl Related<super::user_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::function_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FunctionPermissions.def()
    }
}

impl Related<super::server_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServerPermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
