//! Email composition and delivery for Letterbox.
//!
//! The [`DeliveryEngine`] picks a sender from a [`SenderPool`], composes a
//! MIME message with [`MailComposer`] and hands it to a [`Transport`].
//! Every attempt ends in a [`DeliveryOutcome`]; nothing is retried.
//!
//! ```no_run
//! use letterbox_mail::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let pool = SenderPool::parse("ops@example.com|app-password")?;
//! let transport = SmtpTransport::new(SmtpConfig::new("smtp.example.com"));
//! let engine = DeliveryEngine::new(pool, MailComposer::new("Letterbox"), Arc::new(transport));
//!
//! let content = EmailContent::new("Hello", "<p>Hi there</p>");
//! let outcome = engine.send("reader@example.org", &content).await;
//! assert!(outcome.success);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod attachment;
pub mod composer;
pub mod content;
pub mod engine;
pub mod error;
pub mod transport;

pub use account::{SenderAccount, SenderPool};
pub use attachment::FilePart;
pub use composer::MailComposer;
pub use content::{EmailContent, EmbeddedImage};
pub use engine::{Classification, DeliveryEngine, DeliveryOutcome, classify_submission};
pub use error::{MailError, Result};
pub use transport::{SmtpConfig, SmtpSecurity, SmtpTransport, SubmitError, Transport};
pub use lettre::Message;
