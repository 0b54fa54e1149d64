//! Delivery engine tests against a scripted transport.

use async_trait::async_trait;
use letterbox_mail::{
    DeliveryEngine, EmailContent, MailComposer, Message, SenderAccount, SenderPool, SubmitError,
    Transport,
};
use std::sync::{Arc, Mutex};

/// Transport that returns a fixed result and records what it was given.
struct ScriptedTransport {
    result: Result<(), SubmitError>,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    fn new(result: Result<(), SubmitError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn submit(
        &self,
        account: &SenderAccount,
        message: &Message,
    ) -> Result<(), SubmitError> {
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        self.seen.lock().unwrap().push((account.email.clone(), raw));
        self.result.clone()
    }
}

fn engine(transport: Arc<ScriptedTransport>) -> DeliveryEngine {
    let pool = SenderPool::parse("a@example.com|pw1,b@example.com|pw2").unwrap();
    DeliveryEngine::new(pool, MailComposer::new("Letterbox"), transport)
}

#[tokio::test]
async fn test_successful_send() {
    let transport = ScriptedTransport::new(Ok(()));
    let outcome = engine(transport.clone())
        .send("reader@example.org", &EmailContent::new("Hello", "<p>hi</p>"))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.recipient, "reader@example.org");
    assert!(outcome.detail.is_none());

    let seen = transport.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, outcome.sender);
    assert!(seen[0].1.contains("Subject: Hello"));
    assert!(seen[0].1.contains("To: reader@example.org"));
}

#[tokio::test]
async fn test_disconnect_after_accept_is_success() {
    let transport = ScriptedTransport::new(Err(SubmitError::Disconnected {
        accepted: true,
        detail: "connection closed".to_string(),
    }));
    let outcome = engine(transport)
        .send("reader@example.org", &EmailContent::new("Hello", "<p>hi</p>"))
        .await;

    assert!(outcome.success);
    assert!(outcome.detail.is_some());
}

#[tokio::test]
async fn test_disconnect_before_accept_is_failure() {
    let transport = ScriptedTransport::new(Err(SubmitError::Disconnected {
        accepted: false,
        detail: "connection closed".to_string(),
    }));
    let outcome = engine(transport)
        .send("reader@example.org", &EmailContent::new("Hello", "<p>hi</p>"))
        .await;

    assert!(!outcome.success);
}

#[tokio::test]
async fn test_auth_failure() {
    let transport = ScriptedTransport::new(Err(SubmitError::Auth("535 bad credentials".to_string())));
    let outcome = engine(transport.clone())
        .send("reader@example.org", &EmailContent::new("Hello", "<p>hi</p>"))
        .await;

    assert!(!outcome.success);
    assert!(outcome.detail.unwrap().contains("535"));
    // Single attempt, no retry
    assert_eq!(transport.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_recipient_never_reaches_transport() {
    let transport = ScriptedTransport::new(Ok(()));
    let outcome = engine(transport.clone())
        .send("nobody", &EmailContent::new("Hello", "<p>hi</p>"))
        .await;

    assert!(!outcome.success);
    assert!(transport.seen.lock().unwrap().is_empty());
}
