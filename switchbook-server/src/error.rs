//! HTTP error type. Every handler returns `Result<_, AppError>`; the response
//! body is always `{"error": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use switchbook_catalog::{CsvError, ValidationError};
use switchbook_db::{OperationError, SchemaError};
use switchbook_moderation::ModerationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<OperationError> for AppError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::NotFound { entity_type, .. } => Self::not_found(&capitalize(&entity_type)),
            OperationError::Conflict(msg) => Self::Conflict(msg),
            OperationError::Invalid(msg) => Self::BadRequest(msg),
            e @ OperationError::LimitReached { .. } => Self::BadRequest(e.to_string()),
            e @ (OperationError::Sqlite(_) | OperationError::Json(_)) => Self::Internal(e.to_string()),
        }
    }
}

impl From<ModerationError> for AppError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::Db(e) => e.into(),
            ModerationError::Forbidden => {
                Self::Unauthorized("Administrator privileges required".to_string())
            }
            ModerationError::NotFound { entity_type, .. } => Self::not_found(&capitalize(&entity_type)),
            ModerationError::Conflict(msg) => Self::Conflict(msg),
            ModerationError::Invalid(msg) => Self::BadRequest(msg),
            e @ (ModerationError::NotPending { .. }
            | ModerationError::EmptyEdit
            | ModerationError::Validation(_)
            | ModerationError::Diff(_)) => Self::BadRequest(e.to_string()),
            e @ ModerationError::Sqlite(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<CsvError> for AppError {
    fn from(err: CsvError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Failures that stop the server from starting.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Database error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Invalid bind address '{addr}': {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("Mailer setup failed: {0}")]
    Mailer(String),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
