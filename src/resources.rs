// ABOUTME: Resource descriptors binding each table to its entity, schema, guard and codec hooks
// ABOUTME: Zero-sized markers; the generic store and resolver are instantiated once per marker

use chrono::Utc;
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, IntoActiveModel, Set};
use serde_json::Value;

use crate::auth::Function;
use crate::crypto::{self, CredentialCodec};
use crate::entities::{
    connection_login, connection_type, database, database_type, function_permission,
    function_type, group, login, server, server_permission, server_type, user, user_group,
};
use crate::error::Result;
use crate::schema::{self, Table};
use crate::storage::{self, Creatable, Guard, Mutable, Resource};
use crate::types::{
    DatabaseChanges, DatabaseInput, GroupChanges, GroupInput, LoginChanges, LoginInput, LoginView,
    ServerChanges, ServerInput, TypeRecordInput, UserChanges, UserInput,
};
use crate::validation;

const TYPES_GUARD: Guard = Guard {
    create: Function::CreateTypes,
    modify: Function::ModifyTypes,
    delete: Function::DeleteTypes,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

macro_rules! type_record {
    ($marker:ident, $module:ident, $schema:path) => {
        pub struct $marker;

        impl Resource for $marker {
            type Entity = $module::Entity;
            type Model = $module::Model;
            type ActiveModel = $module::ActiveModel;

            const SCHEMA: &'static schema::Schema = &$schema;
            const ID: $module::Column = $module::Column::Id;
            const GUARD: Guard = TYPES_GUARD;

            fn id(model: &Self::Model) -> i32 {
                model.id
            }
        }

        impl Creatable for $marker {
            type Input = TypeRecordInput;

            const UNIQUE: Option<$module::Column> = Some($module::Column::Description);

            fn new_row(input: TypeRecordInput, _codec: &CredentialCodec) -> Result<Self::ActiveModel> {
                Ok($module::ActiveModel {
                    id: NotSet,
                    description: Set(input.description),
                    creation_date: Set(now()),
                })
            }
        }
    };
}

type_record!(DatabaseTypes, database_type, schema::DATABASE_TYPE);
type_record!(ConnectionTypes, connection_type, schema::CONNECTION_TYPE);
type_record!(ServerTypes, server_type, schema::SERVER_TYPE);
type_record!(FunctionTypes, function_type, schema::FUNCTION_TYPE);

pub struct Groups;

impl Resource for Groups {
    type Entity = group::Entity;
    type Model = group::Model;
    type ActiveModel = group::ActiveModel;

    const SCHEMA: &'static schema::Schema = &schema::GROUP;
    const ID: group::Column = group::Column::Id;
    const GUARD: Guard = Guard {
        create: Function::CreateGroup,
        modify: Function::ModifyGroup,
        delete: Function::DeleteGroup,
    };

    fn id(model: &Self::Model) -> i32 {
        model.id
    }
}

impl Creatable for Groups {
    type Input = GroupInput;

    const UNIQUE: Option<group::Column> = Some(group::Column::Description);

    fn new_row(input: GroupInput, _codec: &CredentialCodec) -> Result<group::ActiveModel> {
        Ok(group::ActiveModel {
            id: NotSet,
            description: Set(input.description),
            creation_date: Set(now()),
        })
    }
}

impl Mutable for Groups {
    type Changes = GroupChanges;

    fn apply_changes(
        current: group::Model,
        changes: GroupChanges,
        _codec: &CredentialCodec,
    ) -> Result<group::ActiveModel> {
        let mut row = current.into_active_model();
        if let Some(description) = changes.description {
            row.description = Set(description);
        }
        Ok(row)
    }
}

pub struct Users;

impl Resource for Users {
    type Entity = user::Entity;
    type Model = user::Model;
    type ActiveModel = user::ActiveModel;

    const SCHEMA: &'static schema::Schema = &schema::USER;
    const ID: user::Column = user::Column::Id;
    const GUARD: Guard = Guard {
        create: Function::CreateUser,
        modify: Function::ModifyUser,
        delete: Function::DeleteUser,
    };

    fn id(model: &Self::Model) -> i32 {
        model.id
    }
}

impl Creatable for Users {
    type Input = UserInput;

    const UNIQUE: Option<user::Column> = Some(user::Column::Name);

    fn validate(input: &UserInput) -> Result<()> {
        validation::check_password_complexity(&input.name, &input.password)
    }

    fn new_row(input: UserInput, _codec: &CredentialCodec) -> Result<user::ActiveModel> {
        Ok(user::ActiveModel {
            id: NotSet,
            name: Set(input.name),
            password_hash: Set(crypto::hash_password(&input.password)?),
            creation_date: Set(now()),
            update_date: Set(None),
        })
    }
}

impl Mutable for Users {
    type Changes = UserChanges;

    fn validate_changes(current: &user::Model, changes: &UserChanges) -> Result<()> {
        if let Some(password) = &changes.password {
            let name = changes.name.as_deref().unwrap_or(&current.name);
            validation::check_password_complexity(name, password)?;
        }
        Ok(())
    }

    fn apply_changes(
        current: user::Model,
        changes: UserChanges,
        _codec: &CredentialCodec,
    ) -> Result<user::ActiveModel> {
        let name = changes.name.unwrap_or_else(|| current.name.clone());
        let mut row = current.into_active_model();

        if let Some(password) = changes.password {
            row.password_hash = Set(crypto::hash_password(&password)?);
        }
        row.name = Set(name);
        row.update_date = Set(Some(now()));
        Ok(row)
    }
}

pub struct Servers;

impl Resource for Servers {
    type Entity = server::Entity;
    type Model = server::Model;
    type ActiveModel = server::ActiveModel;

    const SCHEMA: &'static schema::Schema = &schema::SERVER;
    const ID: server::Column = server::Column::Id;
    const GUARD: Guard = Guard {
        create: Function::CreateServer,
        modify: Function::ModifyServer,
        delete: Function::DeleteServer,
    };

    fn id(model: &Self::Model) -> i32 {
        model.id
    }
}

impl Creatable for Servers {
    type Input = ServerInput;

    fn new_row(input: ServerInput, _codec: &CredentialCodec) -> Result<server::ActiveModel> {
        Ok(server::ActiveModel {
            id: NotSet,
            description: Set(input.description),
            host: Set(input.host),
            port: Set(input.port),
            server_type_id: Set(input.server_type_id),
            connection_type_id: Set(input.connection_type_id),
        })
    }
}

impl Mutable for Servers {
    type Changes = ServerChanges;

    fn apply_changes(
        current: server::Model,
        changes: ServerChanges,
        _codec: &CredentialCodec,
    ) -> Result<server::ActiveModel> {
        let mut row = current.into_active_model();
        if let Some(description) = changes.description {
            row.description = Set(description);
        }
        if let Some(host) = changes.host {
            row.host = Set(host);
        }
        if let Some(port) = changes.port {
            row.port = Set(port);
        }
        Ok(row)
    }
}

pub struct Databases;

impl Resource for Databases {
    type Entity = database::Entity;
    type Model = database::Model;
    type ActiveModel = database::ActiveModel;

    const SCHEMA: &'static schema::Schema = &schema::DATABASE;
    const ID: database::Column = database::Column::Id;
    const GUARD: Guard = Guard {
        create: Function::CreateDatabase,
        modify: Function::ModifyDatabase,
        delete: Function::DeleteDatabase,
    };

    fn id(model: &Self::Model) -> i32 {
        model.id
    }
}

impl Creatable for Databases {
    type Input = DatabaseInput;

    fn new_row(input: DatabaseInput, _codec: &CredentialCodec) -> Result<database::ActiveModel> {
        Ok(database::ActiveModel {
            id: NotSet,
            description: Set(input.description),
            host: Set(input.host),
            port: Set(input.port),
            sid: Set(input.sid),
            database_type_id: Set(input.database_type_id),
        })
    }
}

impl Mutable for Databases {
    type Changes = DatabaseChanges;

    fn apply_changes(
        current: database::Model,
        changes: DatabaseChanges,
        _codec: &CredentialCodec,
    ) -> Result<database::ActiveModel> {
        let mut row = current.into_active_model();
        if let Some(description) = changes.description {
            row.description = Set(description);
        }
        if let Some(host) = changes.host {
            row.host = Set(host);
        }
        if let Some(port) = changes.port {
            row.port = Set(port);
        }
        if let Some(sid) = changes.sid {
            row.sid = Set(sid);
        }
        Ok(row)
    }
}

/// Stored service credentials. The password column is sealed on every write
/// and opened again whenever a row is rendered.
pub struct Logins;

impl Resource for Logins {
    type Entity = login::Entity;
    type Model = login::Model;
    type ActiveModel = login::ActiveModel;

    const SCHEMA: &'static schema::Schema = &schema::LOGIN;
    const ID: login::Column = login::Column::Id;
    const GUARD: Guard = Guard {
        create: Function::CreateLogin,
        modify: Function::ModifyLogin,
        delete: Function::DeleteLogin,
    };
    const READ: Option<Function> = Some(Function::ModifyLogin);

    fn id(model: &Self::Model) -> i32 {
        model.id
    }

    fn to_json(model: &login::Model, codec: &CredentialCodec) -> Result<Value> {
        let view = LoginView {
            id: model.id,
            user: model.user.clone(),
            password: codec.decrypt_credential(&model.password)?,
            connection_type_id: model.connection_type_id,
        };
        Ok(serde_json::to_value(view)?)
    }
}

impl Creatable for Logins {
    type Input = LoginInput;

    fn new_row(input: LoginInput, codec: &CredentialCodec) -> Result<login::ActiveModel> {
        Ok(login::ActiveModel {
            id: NotSet,
            user: Set(input.user),
            password: Set(codec.encrypt_credential(&input.password)?),
            connection_type_id: Set(input.connection_type_id),
        })
    }
}

impl Mutable for Logins {
    type Changes = LoginChanges;

    fn apply_changes(
        current: login::Model,
        changes: LoginChanges,
        codec: &CredentialCodec,
    ) -> Result<login::ActiveModel> {
        let mut row = current.into_active_model();
        if let Some(user) = changes.user {
            row.user = Set(user);
        }
        if let Some(password) = changes.password {
            row.password = Set(codec.encrypt_credential(&password)?);
        }
        Ok(row)
    }
}

macro_rules! link_resource {
    ($marker:ident, $module:ident, $schema:path, $function:expr, $read:expr) => {
        pub struct $marker;

        impl Resource for $marker {
            type Entity = $module::Entity;
            type Model = $module::Model;
            type ActiveModel = $module::ActiveModel;

            const SCHEMA: &'static schema::Schema = &$schema;
            const ID: $module::Column = $module::Column::Id;
            const GUARD: Guard = Guard {
                create: $function,
                modify: $function,
                delete: $function,
            };
            const READ: Option<Function> = $read;

            fn id(model: &Self::Model) -> i32 {
                model.id
            }
        }
    };
}

link_resource!(UserGroups, user_group, schema::USER_GROUP, Function::ModifyUser, None);
link_resource!(
    FunctionPermissions,
    function_permission,
    schema::FUNCTION_PERMISSION,
    Function::ModifyGroup,
    None
);
link_resource!(
    ServerPermissions,
    server_permission,
    schema::SERVER_PERMISSION,
    Function::ModifyGroup,
    None
);
link_resource!(
    ConnectionLogins,
    connection_login,
    schema::CONNECTION_LOGIN,
    Function::ModifyLogin,
    Some(Function::ModifyLogin)
);

async fn row_json<R: Resource, C: ConnectionTrait>(
    db: &C,
    codec: &CredentialCodec,
    id: i32,
) -> Result<Option<Value>> {
    match storage::find::<R, _>(db, id).await? {
        Some(model) => Ok(Some(R::to_json(&model, codec)?)),
        None => Ok(None),
    }
}

/// Renders the row `id` of `table`, or `None` when it does not exist.
pub async fn fetch_json<C: ConnectionTrait>(
    db: &C,
    codec: &CredentialCodec,
    table: Table,
    id: i32,
) -> Result<Option<Value>> {
    match table {
        Table::DatabaseType => row_json::<DatabaseTypes, _>(db, codec, id).await,
        Table::ConnectionType => row_json::<ConnectionTypes, _>(db, codec, id).await,
        Table::ServerType => row_json::<ServerTypes, _>(db, codec, id).await,
        Table::FunctionType => row_json::<FunctionTypes, _>(db, codec, id).await,
        Table::Group => row_json::<Groups, _>(db, codec, id).await,
        Table::User => row_json::<Users, _>(db, codec, id).await,
        Table::UserGroup => row_json::<UserGroups, _>(db, codec, id).await,
        Table::FunctionPermission => row_json::<FunctionPermissions, _>(db, codec, id).await,
        Table::Server => row_json::<Servers, _>(db, codec, id).await,
        Table::ServerPermission => row_json::<ServerPermissions, _>(db, codec, id).await,
        Table::Database => row_json::<Databases, _>(db, codec, id).await,
        Table::Login => row_json::<Logins, _>(db, codec, id).await,
        Table::ConnectionLogin => row_json::<ConnectionLogins, _>(db, codec, id).await,
    }
}
