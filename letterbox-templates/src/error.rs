//! Template error types.

use thiserror::Error;

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template registered under the key.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// The generator could not produce content.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Handlebars render or registration failure.
    #[error("Render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<handlebars::RenderError> for TemplateError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<handlebars::TemplateError> for TemplateError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Render(err.to_string())
    }
}
