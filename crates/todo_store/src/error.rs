//! Todo store error types.

use thiserror::Error;

/// Errors that can occur during todo store operations.
#[derive(Debug, Error)]
pub enum TodoStoreError {
    /// No caller identity on a write.
    #[error("Must be logged in")]
    Unauthenticated,

    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Entity belongs to another user.
    #[error("Not authorized to modify {entity_type} {id}")]
    Forbidden {
        entity_type: &'static str,
        id: String,
    },

    /// Category name already used by this user.
    #[error("Category already exists: {0}")]
    DuplicateName(String),

    /// Category still referenced by todos.
    #[error("Cannot delete category {0:?} while todos use it")]
    InUse(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl TodoStoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(entity_type: &'static str, id: impl ToString) -> Self {
        Self::Forbidden {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Result type for todo store operations.
pub type TodoStoreResult<T> = Result<T, TodoStoreError>;
