//! Delivery engine.

use crate::account::SenderPool;
use crate::composer::MailComposer;
use crate::content::EmailContent;
use crate::transport::{SubmitError, Transport};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of one delivery attempt. Failures are final; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub recipient: String,
    /// Account the message was sent from
    pub sender: String,
    /// Error detail for failed or degraded attempts
    pub detail: Option<String>,
}

/// How a submission result maps to an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Delivered,
    /// The server hung up right after accepting the message.
    DeliveredThenDisconnected(String),
    AuthRejected(String),
    Failed(String),
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Classification::Delivered | Classification::DeliveredThenDisconnected(_)
        )
    }

    fn detail(&self) -> Option<String> {
        match self {
            Classification::Delivered => None,
            Classification::DeliveredThenDisconnected(detail)
            | Classification::AuthRejected(detail)
            | Classification::Failed(detail) => Some(detail.clone()),
        }
    }
}

/// Classify a submission result.
pub fn classify_submission(result: &Result<(), SubmitError>) -> Classification {
    match result {
        Ok(()) => Classification::Delivered,
        Err(SubmitError::Auth(detail)) => Classification::AuthRejected(detail.clone()),
        // Some providers drop the connection instead of answering QUIT once the
        // message is queued. Only a close after the data was accepted counts;
        // a close at any earlier stage is a failure.
        Err(SubmitError::Disconnected {
            accepted: true,
            detail,
        }) => Classification::DeliveredThenDisconnected(detail.clone()),
        Err(other) => Classification::Failed(other.to_string()),
    }
}

/// Composes and submits single-recipient messages.
pub struct DeliveryEngine {
    pool: SenderPool,
    composer: MailComposer,
    transport: Arc<dyn Transport>,
}

impl DeliveryEngine {
    pub fn new(pool: SenderPool, composer: MailComposer, transport: Arc<dyn Transport>) -> Self {
        Self {
            pool,
            composer,
            transport,
        }
    }

    pub fn pool(&self) -> &SenderPool {
        &self.pool
    }

    /// Send `content` to one recipient.
    ///
    /// Never fails; problems are reported through the outcome.
    pub async fn send(&self, recipient: &str, content: &EmailContent) -> DeliveryOutcome {
        let account = self.pool.choose();

        let outcome = |classification: Classification| DeliveryOutcome {
            success: classification.is_success(),
            recipient: recipient.to_string(),
            sender: account.email.clone(),
            detail: classification.detail(),
        };

        let message = match self.composer.compose(account, recipient, content).await {
            Ok(message) => message,
            Err(e) => {
                error!(sender = %account.email, %recipient, error = %e, "could not compose message");
                return outcome(Classification::Failed(e.to_string()));
            }
        };

        let classification = classify_submission(&self.transport.submit(account, &message).await);
        match &classification {
            Classification::Delivered => {
                info!(sender = %account.email, %recipient, subject = %content.subject, "email sent")
            }
            Classification::DeliveredThenDisconnected(detail) => warn!(
                sender = %account.email,
                %recipient,
                %detail,
                "email accepted, server closed the connection early"
            ),
            Classification::AuthRejected(detail) => error!(
                sender = %account.email,
                %recipient,
                %detail,
                "sender authentication failed, check the account credentials"
            ),
            Classification::Failed(detail) => {
                error!(sender = %account.email, %recipient, %detail, "email delivery failed")
            }
        }

        outcome(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify_submission(&Ok(())), Classification::Delivered);
        assert!(classify_submission(&Err(SubmitError::Disconnected {
            accepted: true,
            detail: "eof".to_string()
        }))
        .is_success());
        assert!(!classify_submission(&Err(SubmitError::Disconnected {
            accepted: false,
            detail: "eof".to_string()
        }))
        .is_success());
        assert!(matches!(
            classify_submission(&Err(SubmitError::Auth("535".to_string()))),
            Classification::AuthRejected(_)
        ));
        assert!(!classify_submission(&Err(SubmitError::Rejected("550".to_string()))).is_success());
        assert!(!classify_submission(&Err(SubmitError::Connect("refused".to_string()))).is_success());
    }
}
