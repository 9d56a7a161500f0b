// ABOUTME: Centralized error taxonomy for the entity store, resolver and access gate
// ABOUTME: Maps each domain error to an HTTP status without leaking store internals

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Database(DbErr),
    Unauthenticated,
    Forbidden(String),
    NotFound(String),
    DuplicateKey(String),
    MissingField(Vec<String>),
    ForeignKeyViolation(String),
    RelatedNotFound(String),
    DuplicateLink(String),
    UnresolvedReference(i32),
    PolicyViolation(String),
    BadRequest(String),
    Crypto(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::Unauthenticated => write!(f, "Invalid credentials"),
            AppError::Forbidden(function) => write!(f, "Missing permission: {}", function),
            AppError::NotFound(msg) => write!(f, "{} not found", msg),
            AppError::DuplicateKey(msg) => write!(f, "{} already exists", msg),
            AppError::MissingField(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            AppError::ForeignKeyViolation(field) => {
                write!(f, "Referenced row for {} does not exist", field)
            }
            AppError::RelatedNotFound(side) => write!(f, "{} not found", side),
            AppError::DuplicateLink(msg) => write!(f, "{}: combination already exists", msg),
            AppError::UnresolvedReference(id) => {
                write!(f, "Connection {} matches no server or database", id)
            }
            AppError::PolicyViolation(reason) => write!(f, "{}", reason),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Crypto(msg) => write!(f, "Cryptography error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_)
            | AppError::RelatedNotFound(_)
            | AppError::UnresolvedReference(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateKey(_)
            | AppError::MissingField(_)
            | AppError::ForeignKeyViolation(_)
            | AppError::DuplicateLink(_)
            | AppError::PolicyViolation(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Crypto(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Turns a failed write into a domain error when the engine reports a
    /// constraint violation. `subject` names the row being written.
    pub fn from_write(err: DbErr, subject: &str, is_link: bool) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) if is_link => {
                AppError::DuplicateLink(subject.to_string())
            }
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::DuplicateKey(subject.to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::ForeignKeyViolation(subject.to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(_) => {
                tracing::error!("Database error: {}", self);
                "Database operation failed".to_string()
            }
            AppError::Crypto(_) => {
                tracing::error!("Cryptography error: {}", self);
                "Cryptography operation failed".to_string()
            }
            AppError::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                "Internal server error".to_string()
            }
            AppError::Unauthenticated => {
                tracing::warn!("Rejected credentials");
                self.to_string()
            }
            AppError::Forbidden(_) => {
                tracing::warn!("Forbidden: {}", self);
                self.to_string()
            }
            AppError::NotFound(_) | AppError::RelatedNotFound(_) | AppError::UnresolvedReference(_) => {
                tracing::info!("Not found: {}", self);
                self.to_string()
            }
            _ => {
                tracing::warn!("Rejected request: {}", self);
                self.to_string()
            }
        };

        let mut body = json!({
            "error": message,
            "status": status.as_u16()
        });
        if let AppError::MissingField(fields) = &self {
            body["required_fields"] = json!(fields);
        }

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"connection-manager\""),
            );
        }
        response
    }
}

// Conversion implementations
impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("Invalid payload: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
