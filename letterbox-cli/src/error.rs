//! Error types for the Letterbox CLI.

use letterbox::PipelineError;
use letterbox::config::ConfigError;
use letterbox_log::LogError;
use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug)]
pub enum CliError {
    /// IO error (signals, stdout)
    Io(std::io::Error),

    /// Settings could not be loaded
    Config(ConfigError),

    /// Logging could not be initialized
    Log(LogError),

    /// A pipeline operation failed
    Pipeline(PipelineError),

    /// Invalid argument
    InvalidArgument(String),

    /// Some recipients were not delivered to
    Delivery { failed: usize, total: usize },

    /// Command execution error
    Command(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Log(e) => write!(f, "{}", e),
            CliError::Pipeline(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Delivery { failed, total } => {
                write!(f, "{} of {} deliveries failed", failed, total)
            }
            CliError::Command(msg) => write!(f, "Command error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LogError> for CliError {
    fn from(e: LogError) -> Self {
        CliError::Log(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Command(format!("cannot encode output: {}", e))
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(e: tokio::task::JoinError) -> Self {
        CliError::Command(format!("scheduler task failed: {}", e))
    }
}
