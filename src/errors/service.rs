//! Service-layer error types consumed by the API layer

use thiserror::Error;

use super::{JobError, QueryError, StoreError};

/// Errors returned by the data source, report and job services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Referenced resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request was well-formed but semantically invalid
    #[error("{0}")]
    Validation(String),

    /// Uniqueness constraint violated
    #[error("{0}")]
    Conflict(String),

    /// Job exists but is not in a state that allows the operation
    #[error("{0}")]
    NotReady(String),

    /// Entity store failure
    #[error(transparent)]
    Store(StoreError),

    /// Connector failure during schema discovery
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Job admission or state machine failure
    #[error(transparent)]
    Job(#[from] JobError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            StoreError::DuplicateName { .. } => ServiceError::Conflict(err.to_string()),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::NotFound(_) => true,
            ServiceError::Query(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::Validation(_)
            | ServiceError::Conflict(_)
            | ServiceError::NotReady(_)
            | ServiceError::NotFound(_) => true,
            ServiceError::Query(e) => e.is_client_error() || e.is_not_found(),
            _ => false,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Validation(_) => "VALIDATION_FAILED",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::NotReady(_) => "NOT_READY",
            ServiceError::Store(e) => e.error_code(),
            ServiceError::Query(e) => e.error_code(),
            ServiceError::Job(e) => e.error_code(),
        }
    }
}
