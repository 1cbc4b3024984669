//! Database error types for gfd-db.

use gfd_auth::AuthError;
use gfd_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations and the services built on them.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The requested entity does not exist.
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: String, id: String },

    /// Input rejected by a field rule.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness or business rule would be violated.
    #[error("{0}")]
    Conflict(String),

    /// Invalid state encountered (e.g., an illegal status transition).
    #[error("{0}")]
    InvalidState(String),

    /// Authentication failed or hashing broke.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<CoreError> for DatabaseError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(message) => Self::Validation(message),
            CoreError::InvalidTransition { .. } => Self::InvalidState(error.to_string()),
            CoreError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            CoreError::Other(inner) => Self::Other(inner),
        }
    }
}
