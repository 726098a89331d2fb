//! Report job state machine and runner errors

use thiserror::Error;

use super::{ExportError, QueryError, StoreError};
use crate::models::JobStatus;

/// Report job lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Transition not permitted by the job state machine
    #[error("invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// Admission limit reached
    #[error("job queue is full ({0} jobs in flight)")]
    QueueFull(usize),

    /// Runner has been shut down and accepts no more work
    #[error("job runner is shutting down")]
    ShuttingDown,
}

impl JobError {
    pub fn error_code(&self) -> &'static str {
        match self {
            JobError::InvalidTransition { .. } => "INVALID_STATE",
            JobError::QueueFull(_) | JobError::ShuttingDown => "UNAVAILABLE",
        }
    }
}

/// Why a generation run ended in `failed`. The display text is what lands in
/// the job's `error` field.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("failed to retrieve report definition: {0}")]
    Report(StoreError),

    #[error("failed to retrieve data source: {0}")]
    DataSource(StoreError),

    #[error("query execution failed: {0}")]
    Query(QueryError),

    #[error("file generation failed: {0}")]
    Export(ExportError),

    #[error("job cancelled: {0}")]
    Cancelled(String),

    #[error("job rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = JobError::InvalidTransition {
            from: JobStatus::Completed,
            to: JobStatus::Running,
        };
        assert_eq!(
            err.to_string(),
            "invalid job transition from completed to running"
        );
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[test]
    fn test_generation_error_messages() {
        let err = GenerationError::DataSource(StoreError::not_found("data source", "ds-1"));
        assert_eq!(
            err.to_string(),
            "failed to retrieve data source: data source ds-1 not found"
        );

        let err = GenerationError::Query(QueryError::Timeout(std::time::Duration::from_secs(5)));
        assert_eq!(err.to_string(), "query execution failed: timed out after 5s");
    }

    #[test]
    fn test_queue_full() {
        let err = JobError::QueueFull(64);
        assert_eq!(err.to_string(), "job queue is full (64 jobs in flight)");
        assert_eq!(err.error_code(), "UNAVAILABLE");
    }
}
