// ABOUTME: Payload validation driven by schema descriptors plus the password complexity policy
// ABOUTME: Runs before any write so a rejected request never touches the store

use sea_orm::ConnectionTrait;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::schema::{FieldKind, Schema};

const MIN_PASSWORD_LEN: usize = 8;
const RESERVED_PASSWORDS: [&str; 3] = ["admin", "password", "senha"];

/// Returns the JSON object behind a request body.
pub fn as_object(payload: &Value) -> Result<&Map<String, Value>> {
    payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Body must be a JSON object".to_string()))
}

/// Absent and `null` both count as missing.
pub fn check_required_fields(payload: &Value, schema: &Schema) -> Result<()> {
    let object = as_object(payload)?;
    let missing: Vec<String> = schema
        .required()
        .filter(|name| object.get(*name).map_or(true, Value::is_null))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingField(missing))
    }
}

/// Rejects values whose JSON type does not match the declared field kind.
pub fn check_field_kinds(payload: &Value, schema: &Schema) -> Result<()> {
    let object = as_object(payload)?;
    for field in schema.fields {
        let Some(value) = object.get(field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let valid = match field.kind {
            FieldKind::Text | FieldKind::Secret => value.is_string(),
            FieldKind::Integer => value
                .as_i64()
                .is_some_and(|n| i32::try_from(n).is_ok()),
        };
        if !valid {
            return Err(AppError::BadRequest(format!(
                "Field '{}' has the wrong type",
                field.name
            )));
        }
    }
    Ok(())
}

/// Update payloads may only name descriptive fields.
pub fn check_mutable_fields(payload: &Value, schema: &Schema) -> Result<()> {
    let object = as_object(payload)?;
    for key in object.keys() {
        match schema.field(key) {
            Some(field) if field.mutable => {}
            Some(_) => {
                return Err(AppError::BadRequest(format!(
                    "Field '{}' cannot be modified",
                    key
                )));
            }
            None if key == "id" => {
                return Err(AppError::BadRequest("Field 'id' cannot be modified".to_string()));
            }
            None => {}
        }
    }
    Ok(())
}

/// Every declared reference present in the payload must resolve to a row.
pub async fn check_foreign_keys<C: ConnectionTrait>(
    db: &C,
    payload: &Value,
    schema: &Schema,
) -> Result<()> {
    let object = as_object(payload)?;
    for field in schema.references() {
        let Some(target) = field.references else {
            continue;
        };
        let Some(value) = object.get(field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let id = value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| AppError::ForeignKeyViolation(field.name.to_string()))?;

        if !target.exists(db, id).await? {
            tracing::debug!(field = field.name, target = target.name(), id, "dangling reference");
            return Err(AppError::ForeignKeyViolation(field.name.to_string()));
        }
    }
    Ok(())
}

pub fn check_password_complexity(username: &str, password: &str) -> Result<()> {
    if username == password {
        return Err(AppError::PolicyViolation(
            "User and password cannot be the same".to_string(),
        ));
    }

    if password.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::PolicyViolation(format!(
            "Password needs to be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    if password.contains("123456") {
        return Err(AppError::PolicyViolation(
            "Password should not contain sequential characters".to_string(),
        ));
    }

    if RESERVED_PASSWORDS.contains(&password) {
        return Err(AppError::PolicyViolation("Password is a reserved value".to_string()));
    }

    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    if !(has_lower && has_upper && has_digit && has_symbol) {
        return Err(AppError::PolicyViolation(
            "Password needs upper case, lower case, a digit and a symbol".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DATABASE, DATABASE_TYPE, LOGIN, SERVER};
    use serde_json::json;

    fn policy_reason(username: &str, password: &str) -> String {
        match check_password_complexity(username, password) {
            Err(AppError::PolicyViolation(reason)) => reason,
            other => panic!("expected policy violation, got {:?}", other),
        }
    }

    #[test]
    fn test_strong_password_passes() {
        assert!(check_password_complexity("alice", "Str0ngPass!").is_ok());
        assert!(check_password_complexity("svc", "Tr1cky-Horse").is_ok());
    }

    #[test]
    fn test_password_equal_to_username_is_rejected_first() {
        assert!(policy_reason("alice", "alice").contains("same"));
        // Case-sensitive comparison
        assert!(check_password_complexity("Str0ngPass!", "Str0ngPass!").is_err());
        assert!(check_password_complexity("str0ngpass!", "Str0ngPass!").is_ok());
    }

    #[test]
    fn test_short_password_is_rejected() {
        assert!(policy_reason("alice", "Ab1!").contains("at least 8"));
        // Surrounding whitespace does not count
        assert!(policy_reason("alice", "   Ab1!xy   ").contains("at least 8"));
    }

    #[test]
    fn test_sequence_is_rejected() {
        assert!(policy_reason("alice", "Ab!123456").contains("sequential"));
    }

    #[test]
    fn test_reserved_values_are_rejected() {
        // Reserved values are shorter than the minimum, so the length rule fires first.
        for reserved in RESERVED_PASSWORDS {
            assert!(check_password_complexity("alice", reserved).is_err());
        }
    }

    #[test]
    fn test_weak_composition_is_rejected() {
        for weak in ["alllowercase1!", "ALLUPPERCASE1!", "NoDigitsHere!", "NoSymbols123x"] {
            assert!(policy_reason("alice", weak).contains("symbol"), "{weak}");
        }
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let payload = json!({"description": "db", "port": 1521, "sid": null});
        match check_required_fields(&payload, &DATABASE) {
            Err(AppError::MissingField(missing)) => {
                assert_eq!(missing, ["host", "sid", "database_type_id"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(check_required_fields(&json!({"user": "svc", "password": "p@ss"}), &LOGIN).is_ok());
        assert!(matches!(
            check_required_fields(&json!(["description"]), &DATABASE_TYPE),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_field_kinds_are_checked() {
        let good = json!({"description": "web", "host": "10.0.0.1", "port": 22,
            "server_type_id": 1, "connection_type_id": 1});
        assert!(check_field_kinds(&good, &SERVER).is_ok());

        let bad_port = json!({"port": "22"});
        assert!(check_field_kinds(&bad_port, &SERVER).is_err());

        let overflow = json!({"port": i64::from(i32::MAX) + 1});
        assert!(check_field_kinds(&overflow, &SERVER).is_err());
    }

    #[test]
    fn test_only_descriptive_fields_are_mutable() {
        assert!(check_mutable_fields(&json!({"host": "db2", "port": 5432}), &DATABASE).is_ok());
        assert!(check_mutable_fields(&json!({"database_type_id": 2}), &DATABASE).is_err());
        assert!(check_mutable_fields(&json!({"id": 7}), &DATABASE).is_err());
        assert!(check_mutable_fields(&json!({"description": "X"}), &DATABASE_TYPE).is_err());
    }
}
