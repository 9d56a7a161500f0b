// ABOUTME: Access control gate: basic-auth principals, group membership and function grants
// ABOUTME: Stateless; every request re-authenticates and rejections never say which check failed

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::Engine;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use std::fmt;

use crate::AppState;
use crate::crypto;
use crate::entities::{function_permission, function_type, group, user, user_group};
use crate::error::{AppError, Result};
use crate::storage::Storage;

/// Named permissionable actions, stored as `function_type` descriptions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Function {
    CreateGroup,
    ModifyGroup,
    DeleteGroup,
    CreateUser,
    ModifyUser,
    DeleteUser,
    CreateDatabase,
    ModifyDatabase,
    DeleteDatabase,
    CreateServer,
    ModifyServer,
    DeleteServer,
    CreateTypes,
    ModifyTypes,
    DeleteTypes,
    CreateLogin,
    ModifyLogin,
    DeleteLogin,
}

impl Function {
    pub const ALL: [Function; 18] = [
        Function::CreateGroup,
        Function::ModifyGroup,
        Function::DeleteGroup,
        Function::CreateUser,
        Function::ModifyUser,
        Function::DeleteUser,
        Function::CreateDatabase,
        Function::ModifyDatabase,
        Function::DeleteDatabase,
        Function::CreateServer,
        Function::ModifyServer,
        Function::DeleteServer,
        Function::CreateTypes,
        Function::ModifyTypes,
        Function::DeleteTypes,
        Function::CreateLogin,
        Function::ModifyLogin,
        Function::DeleteLogin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Function::CreateGroup => "CREATE_GROUP",
            Function::ModifyGroup => "MODIFY_GROUP",
            Function::DeleteGroup => "DELETE_GROUP",
            Function::CreateUser => "CREATE_USER",
            Function::ModifyUser => "MODIFY_USER",
            Function::DeleteUser => "DELETE_USER",
            Function::CreateDatabase => "CREATE_DATABASE",
            Function::ModifyDatabase => "MODIFY_DATABASE",
            Function::DeleteDatabase => "DELETE_DATABASE",
            Function::CreateServer => "CREATE_SERVER",
            Function::ModifyServer => "MODIFY_SERVER",
            Function::DeleteServer => "DELETE_SERVER",
            Function::CreateTypes => "CREATE_TYPES",
            Function::ModifyTypes => "MODIFY_TYPES",
            Function::DeleteTypes => "DELETE_TYPES",
            Function::CreateLogin => "CREATE_LOGIN",
            Function::ModifyLogin => "MODIFY_LOGIN",
            Function::DeleteLogin => "DELETE_LOGIN",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a username/password pair to its user.
///
/// Unknown users and wrong passwords both produce `Unauthenticated`, and
/// both paths run one Argon2 verification.
pub async fn authenticate(storage: &Storage, username: &str, password: &str) -> Result<user::Model> {
    let found = user::Entity::find()
        .filter(user::Column::Name.eq(username))
        .one(&storage.db)
        .await?;

    match found {
        Some(user) if crypto::verify_password(password, &user.password_hash) => Ok(user),
        Some(_) => Err(AppError::Unauthenticated),
        None => {
            storage.codec.verify_dummy(password);
            Err(AppError::Unauthenticated)
        }
    }
}

pub async fn groups_of<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<group::Model>> {
    let group_ids = group_ids_of(db, user_id).await?;
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }

    let groups = group::Entity::find()
        .filter(group::Column::Id.is_in(group_ids))
        .all(db)
        .await?;
    Ok(groups)
}

/// Distinct function names granted to any of the user's groups.
pub async fn functions_of<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<String>> {
    let group_ids = group_ids_of(db, user_id).await?;
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }

    let function_ids: Vec<i32> = function_permission::Entity::find()
        .filter(function_permission::Column::GroupId.is_in(group_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|grant| grant.function_id)
        .collect();
    if function_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = function_type::Entity::find()
        .filter(function_type::Column::Id.is_in(function_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|function| function.description)
        .collect();
    names.sort();
    Ok(names)
}

/// True when one of the user's groups holds a grant for `function`.
pub async fn authorize<C: ConnectionTrait>(db: &C, user: &user::Model, function: Function) -> Result<bool> {
    let group_ids = group_ids_of(db, user.id).await?;
    if group_ids.is_empty() {
        return Ok(false);
    }

    let Some(function_row) = function_type::Entity::find()
        .filter(function_type::Column::Description.eq(function.as_str()))
        .one(db)
        .await?
    else {
        return Ok(false);
    };

    let grants = function_permission::Entity::find()
        .filter(
            Condition::all()
                .add(function_permission::Column::GroupId.is_in(group_ids))
                .add(function_permission::Column::FunctionId.eq(function_row.id)),
        )
        .count(db)
        .await?;
    Ok(grants > 0)
}

pub async fn require<C: ConnectionTrait>(db: &C, user: &user::Model, function: Function) -> Result<()> {
    if authorize(db, user, function).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(function.as_str().to_string()))
    }
}

async fn group_ids_of<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<i32>> {
    let ids = user_group::Entity::find()
        .filter(user_group::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|membership| membership.group_id)
        .collect();
    Ok(ids)
}

/// Splits an `Authorization: Basic ...` header value into username and password.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() || password.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

/// The authenticated user behind a request.
pub struct Principal(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let (username, password) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic)
            .ok_or(AppError::Unauthenticated)?;

        let user = authenticate(&state.storage, &username, &password).await?;
        Ok(Principal(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_parse_basic_header() {
        let header = format!("Basic {}", STANDARD.encode("alice:Str0ng:Pass!"));
        assert_eq!(
            parse_basic(&header),
            Some(("alice".to_string(), "Str0ng:Pass!".to_string()))
        );

        let lowercase = format!("basic {}", STANDARD.encode("alice:pw"));
        assert!(parse_basic(&lowercase).is_some());
    }

    #[test]
    fn test_parse_basic_rejects_malformed_headers() {
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
        assert_eq!(parse_basic(&format!("Basic {}", STANDARD.encode("no-colon"))), None);
        assert_eq!(parse_basic(&format!("Basic {}", STANDARD.encode(":pw"))), None);
        assert_eq!(parse_basic(&format!("Basic {}", STANDARD.encode("alice:"))), None);
    }

    #[test]
    fn test_function_names_are_unique() {
        let mut names: Vec<_> = Function::ALL.iter().map(|f| f.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Function::ALL.len());
    }
}
