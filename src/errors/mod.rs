//! Domain-specific error types for reporthub
//!
//! Each domain gets its own error enum so callers can match on the failure
//! they care about, while the HTTP layer maps them to status codes through
//! the `is_not_found` / `is_client_error` / `error_code` helpers.
//!
//! # Error Categories
//!
//! - **StoreError**: entity store lookups and persistence
//! - **QueryError**: connector and query execution failures
//! - **ExportError**: CSV/JSON file generation
//! - **JobError**: job state machine and runner admission
//! - **ServiceError**: CRUD services consumed by the API layer
//!
//! # Examples
//!
//! ```rust
//! use reporthub::errors::{StoreError, ServiceError};
//!
//! let err = StoreError::not_found("report", "42");
//! assert!(err.is_not_found());
//!
//! let err = ServiceError::Conflict("datasource with this name already exists".to_string());
//! assert_eq!(err.error_code(), "CONFLICT");
//! ```

pub mod export;
pub mod job;
pub mod query;
pub mod service;
pub mod store;

pub use export::ExportError;
pub use job::{GenerationError, JobError};
pub use query::QueryError;
pub use service::ServiceError;
pub use store::StoreError;

/// Result type alias for entity store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for query execution
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type alias for file generation
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
