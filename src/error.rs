//! Pipeline error taxonomy.

use letterbox_config::ConfigError;
use letterbox_cron::CronError;
use letterbox_mail::MailError;
use letterbox_templates::TemplateError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced to callers of the job operations.
///
/// Delivery failures are not errors here: they are reported per recipient
/// through [`letterbox_mail::DeliveryOutcome`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before anything was stored.
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Template resolution failed: {0}")]
    TemplateResolution(#[from] TemplateError),

    /// Store or scheduling failure.
    #[error("Scheduler error: {0}")]
    Scheduler(CronError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<CronError> for PipelineError {
    fn from(err: CronError) -> Self {
        match err {
            CronError::JobNotFound(id) => Self::NotFound(id),
            CronError::InvalidExpression(_)
            | CronError::InvalidRunAt(_)
            | CronError::UnknownHandler(_) => Self::Validation(err.to_string()),
            other => Self::Scheduler(other),
        }
    }
}
