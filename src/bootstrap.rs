// ABOUTME: First-run seeding of reference types and the administrative group, user and grants
// ABOUTME: Runs only against an empty users table and skips any row that already exists

use rand::{Rng, distributions::Alphanumeric, thread_rng};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use tracing::info;

use crate::auth::Function;
use crate::error::AppError;
use crate::relations::Link;
use crate::resources::{
    ConnectionTypes, DatabaseTypes, FunctionPermissions, FunctionTypes, Groups, ServerTypes,
    UserGroups, Users,
};
use crate::storage::{Creatable, Storage};
use crate::validation;

pub const ADMIN_NAME: &str = "admin";
pub const ADMIN_GROUP: &str = "admin";

pub const SERVER_TYPES: [&str; 3] = ["LINUX", "WINDOWS", "MAC"];
pub const CONNECTION_TYPES: [&str; 4] = ["SSH", "RDP", "SFTP", "FTP"];
pub const DATABASE_TYPES: [&str; 7] = [
    "ORACLE", "MYSQL", "POSTGRES", "SQLITE", "MONGODB", "REDIS", "MSSQL",
];

/// Random admin password that satisfies the complexity policy.
pub fn generate_admin_password() -> String {
    loop {
        let body: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let candidate = format!("{}-Aa1", body);
        if validation::check_password_complexity(ADMIN_NAME, &candidate).is_ok() {
            return candidate;
        }
    }
}

/// Seeds an empty store. Returns `false` when users already exist.
pub async fn seed(storage: &Storage, admin_password: &str) -> anyhow::Result<bool> {
    if storage.count::<Users>().await? > 0 {
        info!("Users present, skipping bootstrap");
        return Ok(false);
    }

    validation::check_password_complexity(ADMIN_NAME, admin_password)
        .map_err(|e| anyhow::anyhow!("admin password rejected: {}", e))?;

    for name in SERVER_TYPES {
        ensure_row::<ServerTypes>(storage, name, json!({ "description": name })).await?;
    }
    for name in CONNECTION_TYPES {
        ensure_row::<ConnectionTypes>(storage, name, json!({ "description": name })).await?;
    }
    for name in DATABASE_TYPES {
        ensure_row::<DatabaseTypes>(storage, name, json!({ "description": name })).await?;
    }
    let mut function_ids = Vec::with_capacity(Function::ALL.len());
    for function in Function::ALL {
        let name = function.as_str();
        function_ids
            .push(ensure_row::<FunctionTypes>(storage, name, json!({ "description": name })).await?);
    }

    let group_id =
        ensure_row::<Groups>(storage, ADMIN_GROUP, json!({ "description": ADMIN_GROUP })).await?;
    let user_id = ensure_row::<Users>(
        storage,
        ADMIN_NAME,
        json!({ "name": ADMIN_NAME, "password": admin_password }),
    )
    .await?;

    ensure_link::<UserGroups>(storage, group_id, user_id).await?;
    for function_id in function_ids {
        ensure_link::<FunctionPermissions>(storage, group_id, function_id).await?;
    }

    info!(
        functions = Function::ALL.len(),
        "Seeded reference types and the '{}' group and user", ADMIN_GROUP
    );
    Ok(true)
}

/// Id of the row whose unique column equals `value`, creating it from `payload` when absent.
async fn ensure_row<R: Creatable>(
    storage: &Storage,
    value: &str,
    payload: serde_json::Value,
) -> anyhow::Result<i32> {
    let Some(column) = R::UNIQUE else {
        anyhow::bail!("{} has no unique column", R::SCHEMA.table.name());
    };

    if let Some(existing) = R::Entity::find()
        .filter(column.eq(value))
        .one(&storage.db)
        .await?
    {
        return Ok(R::id(&existing));
    }

    let created = storage.create::<R>(payload).await?;
    Ok(R::id(&created))
}

async fn ensure_link<L: Link>(storage: &Storage, parent_id: i32, child_id: i32) -> anyhow::Result<()> {
    let mut payload = serde_json::Map::new();
    payload.insert(L::PARENT.field.to_string(), parent_id.into());
    payload.insert(L::CHILD.field.to_string(), child_id.into());

    match storage.create_link::<L>(payload.into()).await {
        Ok(_) | Err(AppError::DuplicateLink(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
