//! Error types for scheduling operations.

use thiserror::Error;

/// Result type for scheduling operations.
pub type CronResult<T> = Result<T, CronError>;

/// Scheduling errors.
#[derive(Debug, Error)]
pub enum CronError {
    /// Invalid cron expression
    #[error("Invalid cron expression: {0}")]
    InvalidExpression(String),

    /// Invalid one-shot run time
    #[error("Invalid run time: {0}")]
    InvalidRunAt(String),

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// No handler registered under the given name
    #[error("Unknown job handler: {0}")]
    UnknownHandler(String),

    /// Job store failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored timestamp could not be parsed
    #[error("Invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// Job execution failed
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),
}
