//! Cross-cutting error types for Game for Devs.
//!
//! Domain-specific errors (`DatabaseError`, `AuthError`, `ApiError`) live in
//! their own crates. `CoreError` covers what the pure domain layer can reject:
//! malformed grids, bad field values, illegal session transitions.

use thiserror::Error;

/// Errors that can be raised by any Game for Devs crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (grid shape, field constraints).
    #[error("{0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for a validation failure with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
