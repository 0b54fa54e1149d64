// Settings errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no setting named {0:?}")]
    KeyNotFound(String),

    /// The settings file could not be read or has no known format.
    #[error("cannot load settings: {0}")]
    LoadError(String),

    #[error("malformed settings file: {0}")]
    ParseError(String),

    /// A value is present but unacceptable.
    #[error("invalid setting: {0}")]
    ValidationError(String),

    #[error("cannot encode setting: {0}")]
    SerializationError(String),

    #[error("settings do not match the expected shape: {0}")]
    DeserializationError(String),

    #[error(".env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
