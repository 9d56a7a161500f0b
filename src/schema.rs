// ABOUTME: Static per-table schema descriptors consumed by the generic store and validators
// ABOUTME: Each descriptor lists field names, kinds, required/mutable flags and foreign-key targets

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait};

use crate::entities;

/// Every table the service manages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Table {
    DatabaseType,
    ConnectionType,
    ServerType,
    FunctionType,
    Group,
    User,
    UserGroup,
    FunctionPermission,
    Server,
    ServerPermission,
    Database,
    Login,
    ConnectionLogin,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::DatabaseType => "database_type",
            Table::ConnectionType => "connection_type",
            Table::ServerType => "server_type",
            Table::FunctionType => "function_type",
            Table::Group => "groups",
            Table::User => "users",
            Table::UserGroup => "user_group",
            Table::FunctionPermission => "function_permission",
            Table::Server => "server",
            Table::ServerPermission => "server_permission",
            Table::Database => "database",
            Table::Login => "login",
            Table::ConnectionLogin => "connection_login",
        }
    }

    /// Human label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Table::DatabaseType => "DatabaseType",
            Table::ConnectionType => "ConnectionType",
            Table::ServerType => "ServerType",
            Table::FunctionType => "FunctionType",
            Table::Group => "Group",
            Table::User => "User",
            Table::UserGroup => "UserGroup",
            Table::FunctionPermission => "FunctionPermission",
            Table::Server => "Server",
            Table::ServerPermission => "ServerPermission",
            Table::Database => "Database",
            Table::Login => "Login",
            Table::ConnectionLogin => "ConnectionLogin",
        }
    }

    pub async fn exists<C: ConnectionTrait>(self, db: &C, id: i32) -> Result<bool, DbErr> {
        let count = match self {
            Table::DatabaseType => entities::DatabaseType::find_by_id(id).count(db).await?,
            Table::ConnectionType => entities::ConnectionType::find_by_id(id).count(db).await?,
            Table::ServerType => entities::ServerType::find_by_id(id).count(db).await?,
            Table::FunctionType => entities::FunctionType::find_by_id(id).count(db).await?,
            Table::Group => entities::Group::find_by_id(id).count(db).await?,
            Table::User => entities::User::find_by_id(id).count(db).await?,
            Table::UserGroup => entities::UserGroup::find_by_id(id).count(db).await?,
            Table::FunctionPermission => {
                entities::FunctionPermission::find_by_id(id).count(db).await?
            }
            Table::Server => entities::Server::find_by_id(id).count(db).await?,
            Table::ServerPermission => entities::ServerPermission::find_by_id(id).count(db).await?,
            Table::Database => entities::Database::find_by_id(id).count(db).await?,
            Table::Login => entities::Login::find_by_id(id).count(db).await?,
            Table::ConnectionLogin => entities::ConnectionLogin::find_by_id(id).count(db).await?,
        };
        Ok(count > 0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// Plaintext on the wire, transformed by the credential codec before storage.
    Secret,
}

#[derive(Copy, Clone, Debug)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub mutable: bool,
    pub references: Option<Table>,
}

impl Field {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            required: true,
            mutable: true,
            references: None,
        }
    }

    const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
            required: true,
            mutable: true,
            references: None,
        }
    }

    const fn secret(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Secret,
            required: true,
            mutable: true,
            references: None,
        }
    }

    const fn reference(name: &'static str, table: Table) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
            required: true,
            mutable: false,
            references: Some(table),
        }
    }

    const fn fixed(self) -> Self {
        Self {
            mutable: false,
            ..self
        }
    }

    const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }
}

#[derive(Debug)]
pub struct Schema {
    pub table: Table,
    pub fields: &'static [Field],
    /// Field whose value must be unique within the table.
    pub unique: Option<&'static str>,
}

impl Schema {
    pub fn required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    pub fn references(&self) -> impl Iterator<Item = &'static Field> + '_ {
        self.fields.iter().filter(|f| f.references.is_some())
    }

    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const TYPE_RECORD_FIELDS: &[Field] = &[Field::text("description").fixed()];

pub static DATABASE_TYPE: Schema = Schema {
    table: Table::DatabaseType,
    fields: TYPE_RECORD_FIELDS,
    unique: Some("description"),
};

pub static CONNECTION_TYPE: Schema = Schema {
    table: Table::ConnectionType,
    fields: TYPE_RECORD_FIELDS,
    unique: Some("description"),
};

pub static SERVER_TYPE: Schema = Schema {
    table: Table::ServerType,
    fields: TYPE_RECORD_FIELDS,
    unique: Some("description"),
};

pub static FUNCTION_TYPE: Schema = Schema {
    table: Table::FunctionType,
    fields: TYPE_RECORD_FIELDS,
    unique: Some("description"),
};

pub static GROUP: Schema = Schema {
    table: Table::Group,
    fields: &[Field::text("description")],
    unique: Some("description"),
};

pub static USER: Schema = Schema {
    table: Table::User,
    fields: &[Field::text("name"), Field::secret("password")],
    unique: Some("name"),
};

pub static USER_GROUP: Schema = Schema {
    table: Table::UserGroup,
    fields: &[
        Field::reference("group_id", Table::Group),
        Field::reference("user_id", Table::User),
    ],
    unique: None,
};

pub static FUNCTION_PERMISSION: Schema = Schema {
    table: Table::FunctionPermission,
    fields: &[
        Field::reference("group_id", Table::Group),
        Field::reference("function_id", Table::FunctionType),
    ],
    unique: None,
};

pub static SERVER: Schema = Schema {
    table: Table::Server,
    fields: &[
        Field::text("description"),
        Field::text("host"),
        Field::integer("port"),
        Field::reference("server_type_id", Table::ServerType),
        Field::reference("connection_type_id", Table::ConnectionType),
    ],
    unique: None,
};

pub static SERVER_PERMISSION: Schema = Schema {
    table: Table::ServerPermission,
    fields: &[
        Field::reference("group_id", Table::Group),
        Field::reference("server_id", Table::Server),
    ],
    unique: None,
};

pub static DATABASE: Schema = Schema {
    table: Table::Database,
    fields: &[
        Field::text("description"),
        Field::text("host"),
        Field::integer("port"),
        Field::text("sid"),
        Field::reference("database_type_id", Table::DatabaseType),
    ],
    unique: None,
};

pub static LOGIN: Schema = Schema {
    table: Table::Login,
    fields: &[
        Field::text("user"),
        Field::secret("password"),
        Field::reference("connection_type_id", Table::ConnectionType).optional(),
    ],
    unique: None,
};

// connection_id is polymorphic, so it carries no single reference target.
pub static CONNECTION_LOGIN: Schema = Schema {
    table: Table::ConnectionLogin,
    fields: &[
        Field::reference("login_id", Table::Login),
        Field::integer("connection_id").fixed(),
    ],
    unique: None,
};
