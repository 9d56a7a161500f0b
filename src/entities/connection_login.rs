// ABOUTME: Link entity attaching a login to a connection target
// ABOUTME: connection_id is polymorphic: it names a server, or failing that a database

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connection_login")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub login_id: i32,
    pub connection_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::login::Entity",
        from = "Column::LoginId",
        to = "super::login::Column::Id"
    )]
    Login,
}

impl Related<super::login::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Login.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
