// ABOUTME: Link entity granting a group the right to invoke a named function
// ABOUTME: The (group_id, function_id) pair is unique

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "function_permission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub group_id: i32,
    pub function_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::function_type::Entity",
        from = "Column::FunctionId",
        to = "super::function_type::Column::Id"
    )]
    Function,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::function_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Function.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
