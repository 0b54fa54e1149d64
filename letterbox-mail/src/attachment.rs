//! File parts loaded from disk.

use crate::{MailError, Result};
use lettre::message::header::ContentType;
use std::path::Path;

/// File part ready to be added to a message.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// File name shown to the recipient.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// File content.
    pub data: Vec<u8>,
}

impl FilePart {
    /// Create a part from bytes, guessing the MIME type from the file name.
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Self {
            filename,
            content_type,
            data: data.into(),
        }
    }

    /// Read a part from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MailError::Attachment(format!("invalid file name: {}", path.display()))
            })?
            .to_string();

        let data = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(filename, data))
    }

    pub(crate) fn lettre_content_type(&self) -> ContentType {
        self.content_type.parse().unwrap_or(ContentType::TEXT_PLAIN)
    }

    /// Get the size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_guess() {
        assert_eq!(FilePart::from_bytes("chart.png", vec![0u8; 4]).content_type, "image/png");
        assert_eq!(FilePart::from_bytes("report.pdf", vec![]).content_type, "application/pdf");
        assert_eq!(
            FilePart::from_bytes("blob", vec![]).content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let part = FilePart::from_file(&path).await.unwrap();
        assert_eq!(part.filename, "notes.txt");
        assert_eq!(part.content_type, "text/plain");
        assert_eq!(part.size(), 5);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = FilePart::from_file("/definitely/not/here.txt").await;
        assert!(matches!(result, Err(MailError::Io(_))));
    }
}
