//! Entity store error types

use thiserror::Error;

/// Entity store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Entity not found by ID (or soft-deleted)
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "report"
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Another live entity already uses this name
    #[error("{entity} named '{name}' already exists")]
    DuplicateName {
        entity: &'static str,
        name: String,
    },

    /// Entity could not be stored
    #[error("Invalid {0}: missing identifier")]
    InvalidEntity(&'static str),

    /// Stored row could not be mapped back to the domain model
    #[error("Corrupt {entity} record {id}: {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn corrupt(entity: &'static str, id: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            entity,
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_name(entity: &'static str, name: impl Into<String>) -> Self {
        StoreError::DuplicateName {
            entity,
            name: name.into(),
        }
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::DuplicateName { .. } => "CONFLICT",
            StoreError::InvalidEntity(_) => "VALIDATION_FAILED",
            StoreError::Corrupt { .. } | StoreError::Database(_) => "DATABASE_ERROR",
        }
    }
}
