//! Rendered email content.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An image shown inline in the HTML body via `cid:` references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub path: PathBuf,
    pub cid: String,
}

impl EmbeddedImage {
    pub fn new(path: impl Into<PathBuf>, cid: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cid: cid.into(),
        }
    }
}

/// Everything needed to compose one message, minus sender and recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,

    /// Files sent as regular attachments
    #[serde(default)]
    pub attachments: Vec<PathBuf>,

    /// Images referenced from `html`
    #[serde(default)]
    pub embedded_images: Vec<EmbeddedImage>,
}

impl EmailContent {
    pub fn new(subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn attach(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    pub fn embed(mut self, path: impl Into<PathBuf>, cid: impl Into<String>) -> Self {
        self.embedded_images.push(EmbeddedImage::new(path, cid));
        self
    }

    /// Replace the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}
