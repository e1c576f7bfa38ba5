//! Error type shared by every moderation workflow.

use switchbook_catalog::{DiffError, ValidationError};
use switchbook_db::OperationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Database error: {0}")]
    Db(#[from] OperationError),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Administrator privileges required")]
    Forbidden,
    #[error("{entity_type} '{id}' not found")]
    NotFound { entity_type: String, id: String },
    #[error("{entity_type} is {status}, expected PENDING")]
    NotPending {
        entity_type: &'static str,
        status: &'static str,
    },
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Edit does not change any field")]
    EmptyEdit,
}

impl ModerationError {
    pub(crate) fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}
