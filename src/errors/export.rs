//! Report file generation error types

use thiserror::Error;

/// Errors raised while writing a report output file
#[derive(Error, Debug)]
pub enum ExportError {
    /// Directory creation, file creation, write or rename failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding error
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Buffered CSV writer could not be flushed
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

impl<W> From<csv::IntoInnerError<W>> for ExportError {
    fn from(err: csv::IntoInnerError<W>) -> Self {
        ExportError::Buffer(err.error().to_string())
    }
}

impl ExportError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ExportError::Io(_) => "IO_ERROR",
            ExportError::Csv(_) | ExportError::Buffer(_) => "CSV_ERROR",
            ExportError::Json(_) => "JSON_ERROR",
        }
    }
}
