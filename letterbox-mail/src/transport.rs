//! Message submission.

use async_trait::async_trait;
use lettre::Message;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use std::error::Error as StdError;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::account::SenderAccount;
use crate::MailError;

/// Why a submission did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Could not reach or negotiate with the server.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server rejected the account credentials.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The server refused the message.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// The peer closed the connection. `accepted` records whether the
    /// message had already been accepted at that point.
    #[error("connection closed by server (accepted: {accepted}): {detail}")]
    Disconnected { accepted: bool, detail: String },

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Message transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit `message` authenticated as `account`.
    async fn submit(&self, account: &SenderAccount, message: &Message) -> Result<(), SubmitError>;
}

/// SMTP security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// No encryption (port 25, not recommended).
    None,
    /// STARTTLS upgrade (port 587).
    StartTls,
    /// Implicit TLS (port 465).
    #[default]
    Tls,
}

impl FromStr for SmtpSecurity {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" | "ssl" => Ok(SmtpSecurity::Tls),
            "starttls" => Ok(SmtpSecurity::StartTls),
            "none" | "plain" => Ok(SmtpSecurity::None),
            other => Err(MailError::Config(format!("unknown SMTP security mode {:?}", other))),
        }
    }
}

/// SMTP server settings shared by every sender account.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Security mode.
    pub security: SmtpSecurity,
    /// Connection and command timeout.
    pub timeout: Duration,
}

impl SmtpConfig {
    /// Implicit TLS on port 465.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 465,
            security: SmtpSecurity::Tls,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the security mode without touching the port.
    pub fn security(mut self, security: SmtpSecurity) -> Self {
        self.security = security;
        self
    }

    /// Use STARTTLS security (port 587).
    pub fn starttls(mut self) -> Self {
        self.security = SmtpSecurity::StartTls;
        self.port = 587;
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// SMTP transport.
///
/// Opens one connection per submission so that each message can be sent
/// with a different account.
pub struct SmtpTransport {
    config: SmtpConfig,
    hello: ClientId,
}

impl SmtpTransport {
    pub fn new(config: SmtpConfig) -> Self {
        info!(
            host = %config.host,
            port = config.port,
            security = ?config.security,
            "SMTP transport initialized"
        );
        Self {
            config,
            hello: ClientId::default(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    fn tls_parameters(&self) -> Result<TlsParameters, SubmitError> {
        TlsParameters::new(self.config.host.clone()).map_err(|e| SubmitError::Connect(e.to_string()))
    }

    async fn connect(&self) -> Result<AsyncSmtpConnection, SubmitError> {
        let implicit_tls = match self.config.security {
            SmtpSecurity::Tls => Some(self.tls_parameters()?),
            SmtpSecurity::StartTls | SmtpSecurity::None => None,
        };

        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (self.config.host.as_str(), self.config.port),
            Some(self.config.timeout),
            &self.hello,
            implicit_tls,
            None,
        )
        .await
        .map_err(|e| SubmitError::Connect(e.to_string()))?;

        if self.config.security == SmtpSecurity::StartTls {
            conn.starttls(self.tls_parameters()?, &self.hello)
                .await
                .map_err(|e| SubmitError::Connect(e.to_string()))?;
        }

        Ok(conn)
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn submit(&self, account: &SenderAccount, message: &Message) -> Result<(), SubmitError> {
        let mut conn = self.connect().await?;

        let credentials = Credentials::new(account.email.clone(), account.password.clone());
        conn.auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .await
            .map_err(|e| {
                if e.is_permanent() || e.is_transient() {
                    SubmitError::Auth(e.to_string())
                } else {
                    transport_error(e, false)
                }
            })?;

        debug!(sender = %account.email, "sending message via SMTP");
        conn.send(message.envelope(), &message.formatted())
            .await
            .map_err(|e| {
                if e.is_permanent() || e.is_transient() {
                    SubmitError::Rejected(e.to_string())
                } else {
                    transport_error(e, false)
                }
            })?;

        // The server has replied 250 to the message data from here on.
        conn.quit().await.map_err(quit_error)?;
        Ok(())
    }
}

/// Map a failed QUIT. The message is already queued at this point.
fn quit_error(err: lettre::transport::smtp::Error) -> SubmitError {
    // A server that closes the socket cleanly leaves lettre reading an
    // incomplete response, which carries neither a status code nor an io error.
    let hung_up = err.is_response() && err.status().is_none();
    if hung_up || is_closed_connection(&err) {
        SubmitError::Disconnected {
            accepted: true,
            detail: err.to_string(),
        }
    } else {
        SubmitError::Other(err.to_string())
    }
}

fn transport_error(err: lettre::transport::smtp::Error, accepted: bool) -> SubmitError {
    if is_closed_connection(&err) {
        SubmitError::Disconnected {
            accepted,
            detail: err.to_string(),
        }
    } else {
        SubmitError::Other(err.to_string())
    }
}

/// Whether the error chain bottoms out in the peer closing the socket.
fn is_closed_connection(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            );
        }
        current = e.source();
    }
    false
}
