// ABOUTME: Relationship resolver for link tables: checked link creation and denormalized reads
// ABOUTME: Also resolves the polymorphic connection reference (server first, then database)

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, TransactionTrait,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::entities::{
    connection_login, database, function_permission, server, server_permission, user_group,
};
use crate::error::{AppError, Result};
use crate::resources::{
    self, ConnectionLogins, FunctionPermissions, ServerPermissions, UserGroups,
};
use crate::schema::Table;
use crate::storage::{self, Resource, Storage};
use crate::validation;

/// Where one side of a link points.
#[derive(Copy, Clone, Debug)]
pub enum Target {
    Table(Table),
    /// A server or a database, decided at read time.
    Connection,
}

#[derive(Copy, Clone, Debug)]
pub struct Side {
    /// Payload and column name holding the id.
    pub field: &'static str,
    /// Key the related row is embedded under when expanded.
    pub key: &'static str,
    pub target: Target,
}

/// A many-to-many row joining two other rows.
pub trait Link: Resource {
    const PARENT: Side;
    const CHILD: Side;
    const PARENT_COLUMN: <Self::Entity as EntityTrait>::Column;
    const CHILD_COLUMN: <Self::Entity as EntityTrait>::Column;

    fn pair(model: &Self::Model) -> (i32, i32);

    fn new_link(parent_id: i32, child_id: i32) -> Self::ActiveModel;
}

/// The polymorphic target of a connection login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Connection {
    Server(server::Model),
    Database(database::Model),
}

impl Link for UserGroups {
    const PARENT: Side = Side {
        field: "group_id",
        key: "group",
        target: Target::Table(Table::Group),
    };
    const CHILD: Side = Side {
        field: "user_id",
        key: "user",
        target: Target::Table(Table::User),
    };
    const PARENT_COLUMN: user_group::Column = user_group::Column::GroupId;
    const CHILD_COLUMN: user_group::Column = user_group::Column::UserId;

    fn pair(model: &user_group::Model) -> (i32, i32) {
        (model.group_id, model.user_id)
    }

    fn new_link(group_id: i32, user_id: i32) -> user_group::ActiveModel {
        user_group::ActiveModel {
            id: sea_orm::NotSet,
            group_id: sea_orm::Set(group_id),
            user_id: sea_orm::Set(user_id),
        }
    }
}

impl Link for FunctionPermissions {
    const PARENT: Side = Side {
        field: "group_id",
        key: "group",
        target: Target::Table(Table::Group),
    };
    const CHILD: Side = Side {
        field: "function_id",
        key: "function",
        target: Target::Table(Table::FunctionType),
    };
    const PARENT_COLUMN: function_permission::Column = function_permission::Column::GroupId;
    const CHILD_COLUMN: function_permission::Column = function_permission::Column::FunctionId;

    fn pair(model: &function_permission::Model) -> (i32, i32) {
        (model.group_id, model.function_id)
    }

    fn new_link(group_id: i32, function_id: i32) -> function_permission::ActiveModel {
        function_permission::ActiveModel {
            id: sea_orm::NotSet,
            group_id: sea_orm::Set(group_id),
            function_id: sea_orm::Set(function_id),
        }
    }
}

impl Link for ServerPermissions {
    const PARENT: Side = Side {
        field: "group_id",
        key: "group",
        target: Target::Table(Table::Group),
    };
    const CHILD: Side = Side {
        field: "server_id",
        key: "server",
        target: Target::Table(Table::Server),
    };
    const PARENT_COLUMN: server_permission::Column = server_permission::Column::GroupId;
    const CHILD_COLUMN: server_permission::Column = server_permission::Column::ServerId;

    fn pair(model: &server_permission::Model) -> (i32, i32) {
        (model.group_id, model.server_id)
    }

    fn new_link(group_id: i32, server_id: i32) -> server_permission::ActiveModel {
        server_permission::ActiveModel {
            id: sea_orm::NotSet,
            group_id: sea_orm::Set(group_id),
            server_id: sea_orm::Set(server_id),
        }
    }
}

impl Link for ConnectionLogins {
    const PARENT: Side = Side {
        field: "login_id",
        key: "login",
        target: Target::Table(Table::Login),
    };
    const CHILD: Side = Side {
        field: "connection_id",
        key: "connection",
        target: Target::Connection,
    };
    const PARENT_COLUMN: connection_login::Column = connection_login::Column::LoginId;
    const CHILD_COLUMN: connection_login::Column = connection_login::Column::ConnectionId;

    fn pair(model: &connection_login::Model) -> (i32, i32) {
        (model.login_id, model.connection_id)
    }

    fn new_link(login_id: i32, connection_id: i32) -> connection_login::ActiveModel {
        connection_login::ActiveModel {
            id: sea_orm::NotSet,
            login_id: sea_orm::Set(login_id),
            connection_id: sea_orm::Set(connection_id),
        }
    }
}

fn side_id(payload: &Value, side: &Side) -> Result<i32> {
    payload
        .get(side.field)
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| AppError::BadRequest(format!("Field '{}' must be an integer", side.field)))
}

fn missing_side(side: &Side, id: i32) -> AppError {
    let label = match side.target {
        Target::Table(table) => table.label(),
        Target::Connection => "Connection",
    };
    AppError::RelatedNotFound(format!("{} {}", label, id))
}

async fn lookup_connection<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Connection>> {
    if let Some(server) = server::Entity::find_by_id(id).one(db).await? {
        return Ok(Some(Connection::Server(server)));
    }
    if let Some(database) = database::Entity::find_by_id(id).one(db).await? {
        return Ok(Some(Connection::Database(database)));
    }
    Ok(None)
}

impl Storage {
    /// Inserts a link after checking both sides exist and the pair is new.
    pub async fn create_link<L: Link>(&self, payload: Value) -> Result<L::Model> {
        validation::check_required_fields(&payload, L::SCHEMA)?;
        validation::check_field_kinds(&payload, L::SCHEMA)?;
        let parent_id = side_id(&payload, &L::PARENT)?;
        let child_id = side_id(&payload, &L::CHILD)?;

        let txn = self.db.begin().await?;
        for (side, id) in [(L::PARENT, parent_id), (L::CHILD, child_id)] {
            let exists = match side.target {
                Target::Table(table) => table.exists(&txn, id).await?,
                Target::Connection => {
                    if lookup_connection(&txn, id).await?.is_none() {
                        return Err(AppError::UnresolvedReference(id));
                    }
                    true
                }
            };
            if !exists {
                debug!(
                    operation = "create_link",
                    table = L::SCHEMA.table.name(),
                    side = side.field,
                    id,
                    "missing side"
                );
                return Err(missing_side(&side, id));
            }
        }

        let duplicates = L::Entity::find()
            .filter(
                Condition::all()
                    .add(L::PARENT_COLUMN.eq(parent_id))
                    .add(L::CHILD_COLUMN.eq(child_id)),
            )
            .count(&txn)
            .await?;
        if duplicates > 0 {
            return Err(AppError::DuplicateLink(L::SCHEMA.table.label().to_string()));
        }

        let inserted = L::new_link(parent_id, child_id)
            .insert(&txn)
            .await
            .map_err(|err| AppError::from_write(err, L::SCHEMA.table.label(), true))?;
        let stored = storage::read_back::<L, _>(&txn, L::id(&inserted)).await?;
        txn.commit().await?;

        debug!(operation = "create_link", table = L::SCHEMA.table.name(), id = L::id(&stored));
        Ok(stored)
    }

    /// Embeds both related rows in full. A missing side is an error.
    pub async fn expand<L: Link>(&self, link: &L::Model) -> Result<Value> {
        self.render_link::<L>(link, true).await
    }

    /// Like `expand`, but a missing side renders as `null`.
    pub async fn expand_lenient<L: Link>(&self, link: &L::Model) -> Result<Value> {
        self.render_link::<L>(link, false).await
    }

    pub async fn resolve_polymorphic(&self, connection_id: i32) -> Result<Connection> {
        lookup_connection(&self.db, connection_id)
            .await?
            .ok_or(AppError::UnresolvedReference(connection_id))
    }

    async fn render_link<L: Link>(&self, link: &L::Model, strict: bool) -> Result<Value> {
        let (parent_id, child_id) = L::pair(link);
        let mut object = Map::new();
        object.insert("id".to_string(), Value::from(L::id(link)));

        for (side, id) in [(L::PARENT, parent_id), (L::CHILD, child_id)] {
            let related = self.side_json(&side, id).await?;
            let value = match related {
                Some(value) => value,
                None if strict => return Err(missing_side(&side, id)),
                None => Value::Null,
            };
            object.insert(side.field.to_string(), Value::from(id));
            object.insert(side.key.to_string(), value);
        }

        Ok(Value::Object(object))
    }

    async fn side_json(&self, side: &Side, id: i32) -> Result<Option<Value>> {
        match side.target {
            Target::Table(table) => resources::fetch_json(&self.db, &self.codec, table, id).await,
            Target::Connection => match lookup_connection(&self.db, id).await? {
                Some(connection) => Ok(Some(serde_json::to_value(connection)?)),
                None => Ok(None),
            },
        }
    }
}
