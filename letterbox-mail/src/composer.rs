//! MIME message composition.

use crate::account::SenderAccount;
use crate::attachment::FilePart;
use crate::content::EmailContent;
use crate::{MailError, Result};
use lettre::Message;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, warn};

/// Builds outgoing messages.
///
/// Layout:
///
/// ```text
/// multipart/mixed
/// ├── multipart/related
/// │   ├── text/html
/// │   └── image parts (inline, Content-ID)
/// └── file parts (attachment, filename)
/// ```
#[derive(Debug, Clone)]
pub struct MailComposer {
    sender_name: String,
}

impl MailComposer {
    pub fn new(sender_name: impl Into<String>) -> Self {
        Self {
            sender_name: sender_name.into(),
        }
    }

    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    /// Compose a message from `account` to `recipient`.
    ///
    /// Files that cannot be read are left out with a warning.
    pub async fn compose(
        &self,
        account: &SenderAccount,
        recipient: &str,
        content: &EmailContent,
    ) -> Result<Message> {
        let from = Mailbox::new(Some(self.sender_name.clone()), account.email.parse()?);
        let to: Mailbox = recipient
            .trim()
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", recipient, e)))?;

        let mut related = MultiPart::related().singlepart(SinglePart::html(content.html.clone()));
        let mut embedded = HashSet::new();
        for image in &content.embedded_images {
            if embedded.contains(image.cid.as_str()) {
                warn!(path = %image.path.display(), cid = %image.cid, "duplicate content id, image skipped");
                continue;
            }
            if let Some(part) = load_part(&image.path).await {
                let content_type = part.lettre_content_type();
                related = related.singlepart(
                    Attachment::new_inline(image.cid.clone()).body(part.data, content_type),
                );
                embedded.insert(image.cid.as_str());
                debug!(path = %image.path.display(), cid = %image.cid, "embedded image");
            }
        }

        let mut mixed = MultiPart::mixed().multipart(related);
        for path in &content.attachments {
            if let Some(part) = load_part(path).await {
                let content_type = part.lettre_content_type();
                mixed = mixed.singlepart(Attachment::new(part.filename).body(part.data, content_type));
                debug!(path = %path.display(), "attached file");
            }
        }

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(content.subject.clone())
            .multipart(mixed)?;

        Ok(message)
    }
}

async fn load_part(path: &Path) -> Option<FilePart> {
    match FilePart::from_file(path).await {
        Ok(part) => Some(part),
        Err(MailError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "file not found, skipped");
            None
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not read file, skipped");
            None
        }
    }
}
