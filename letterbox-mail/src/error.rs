//! Errors raised while preparing a message.
//!
//! Submission failures are not errors at this level: they end up in a
//! [`DeliveryOutcome`](crate::DeliveryOutcome).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MailError>;

#[derive(Debug, Error)]
pub enum MailError {
    /// A sender or recipient address that lettre cannot parse.
    #[error("bad address {0}")]
    InvalidAddress(String),

    /// An attachment path without a usable file name.
    #[error("cannot attach {0}")]
    Attachment(String),

    #[error("cannot build message: {0}")]
    Build(String),

    /// Sender pool or SMTP settings are unusable.
    #[error("mail setup: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<lettre::address::AddressError> for MailError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Build(err.to_string())
    }
}
