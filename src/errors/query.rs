//! Query execution error types

use std::time::Duration;

use thiserror::Error;

use crate::models::DataSourceType;

/// Connector and query execution errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// No connector exists for this data source type
    #[error("no connector available for {0} data sources")]
    UnsupportedType(DataSourceType),

    /// Data source attributes are incomplete or malformed
    #[error("invalid data source configuration: {0}")]
    InvalidConfig(String),

    /// Could not connect to the target system
    #[error("connection failed: {0}")]
    Connection(String),

    /// The target system rejected or failed the query
    #[error("{0}")]
    Execution(String),

    /// Schema entity (table, file) not present in the data source
    #[error("entity '{0}' not found")]
    EntityNotFound(String),

    /// Query step exceeded its deadline
    #[error("timed out after {:?}", .0)]
    Timeout(Duration),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

impl QueryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::EntityNotFound(_))
    }

    /// Errors caused by how the data source was configured rather than the target system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QueryError::UnsupportedType(_) | QueryError::InvalidConfig(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::EntityNotFound(_) => "NOT_FOUND",
            QueryError::UnsupportedType(_) | QueryError::InvalidConfig(_) => "VALIDATION_FAILED",
            QueryError::Connection(_) => "CONNECTION_FAILED",
            QueryError::Timeout(_) => "TIMEOUT",
            QueryError::Execution(_) | QueryError::Io(_) | QueryError::Csv(_) => "QUERY_FAILED",
        }
    }
}

impl From<sea_orm::DbErr> for QueryError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::Conn(e) => QueryError::Connection(e.to_string()),
            other => QueryError::Execution(other.to_string()),
        }
    }
}
