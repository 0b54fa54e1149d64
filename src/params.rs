//! Parameters stored on delivery jobs.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Handler for one-shot jobs: one recipient.
pub const SEND_ONE_EMAIL: &str = "send_one_email";

/// Handler for cron jobs: every recipient in the list.
pub const SEND_TO_MANY: &str = "send_to_many";

/// Parameter bag of a delivery job.
///
/// One-shot jobs carry `recipient`, cron jobs carry `recipients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryParams {
    pub template_key: String,

    #[serde(default)]
    pub template_data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,

    /// Replaces the template's own subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_subject: Option<String>,

    /// Staged uploads, deleted once the firing completes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temp_attachments: Vec<PathBuf>,

    /// Run the template but send nothing.
    #[serde(default)]
    pub silent_run: bool,
}

impl DeliveryParams {
    fn base(template_key: impl Into<String>, template_data: Value) -> Self {
        Self {
            template_key: template_key.into(),
            template_data,
            recipient: None,
            recipients: Vec::new(),
            custom_subject: None,
            temp_attachments: Vec::new(),
            silent_run: false,
        }
    }

    /// Parameters for a single recipient.
    pub fn one(recipient: impl Into<String>, template_key: impl Into<String>, template_data: Value) -> Self {
        Self {
            recipient: Some(recipient.into()),
            ..Self::base(template_key, template_data)
        }
    }

    /// Parameters for a recipient list.
    pub fn many<I, S>(recipients: I, template_key: impl Into<String>, template_data: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            recipients: recipients.into_iter().map(Into::into).collect(),
            ..Self::base(template_key, template_data)
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.custom_subject = Some(subject.into());
        self
    }

    pub fn with_attachments(mut self, paths: Vec<PathBuf>) -> Self {
        self.temp_attachments = paths;
        self
    }

    pub fn silent(mut self, silent_run: bool) -> Self {
        self.silent_run = silent_run;
        self
    }

    /// The custom subject, if one is set and not blank.
    pub fn subject_override(&self) -> Option<&str> {
        self.custom_subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn from_value(value: &Value) -> PipelineResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| PipelineError::validation(format!("malformed job parameters: {}", e)))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Trim a single address and check its shape.
pub fn normalize_recipient(recipient: &str) -> PipelineResult<String> {
    let trimmed = recipient.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::validation("recipient is required"));
    }
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(PipelineError::validation(format!(
            "invalid recipient address {:?}",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim, validate, sort and deduplicate a recipient list.
pub fn normalize_recipients<S: AsRef<str>>(recipients: &[S]) -> PipelineResult<Vec<String>> {
    let mut normalized = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let recipient: &str = recipient.as_ref();
        if !recipient.trim().is_empty() {
            normalized.push(normalize_recipient(recipient)?);
        }
    }

    if normalized.is_empty() {
        return Err(PipelineError::validation("recipient list is empty"));
    }
    normalized.sort();
    normalized.dedup();
    Ok(normalized)
}
