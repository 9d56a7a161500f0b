// ABOUTME: Server entity describing a reachable host and how to connect to it
// ABOUTME: Classified by server type (OS) and connection type (protocol)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "server")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    pub host: String,
    pub port: i32,
    pub server_type_id: i32,
    pub connection_type_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::server_type::Entity",
        from = "Column::ServerTypeId",
        to = "super::server_type::Column::Id"
    )]
    ServerType,
    #[sea_orm(
        belongs_to = "super::connection_type::Entity",
        from = "Column::ConnectionTypeId",
        to = "super::connection_type::Column::Id"
    )]
    ConnectionType,
    #[sea_orm(has_many = "super::server_permission::Entity")]
    Permissions,
}

impl Related<super::server_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServerType.def()
    }
}

impl Related<super::connection_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectionType.def()
    }
}

impl Related<super::server_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Permissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
