//! Template key + input data -> email content.

use crate::envelope::Envelope;
use crate::error::{TemplateError, TemplateResult};
use crate::generator::Generated;
use crate::registry::TemplateRegistry;
use letterbox_mail::EmailContent;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of resolving a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Final content, envelope applied.
    Content(EmailContent),
    /// The generator asked for this firing to be skipped.
    Abort,
}

/// Resolves templates against a fixed registry.
pub struct TemplateResolver {
    registry: Arc<TemplateRegistry>,
    envelope: Envelope,
}

impl TemplateResolver {
    pub fn new(registry: Arc<TemplateRegistry>, envelope: Envelope) -> Self {
        Self { registry, envelope }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Run the generator for `key` and frame its output.
    ///
    /// Missing input fields are filled from the template's field defaults.
    pub async fn resolve(&self, key: &str, data: &Value) -> TemplateResult<Resolution> {
        let entry = self
            .registry
            .get(key)
            .ok_or_else(|| TemplateError::NotFound(key.to_string()))?;

        let input = entry.meta.with_defaults(data);
        debug!(template = %key, is_async = entry.generator.is_async(), "invoking generator");

        match entry.generator.invoke(input).await? {
            Generated::Abort => {
                info!(template = %key, "generator aborted, nothing to send");
                Ok(Resolution::Abort)
            }
            Generated::Content(raw) => {
                let html = self.envelope.wrap(&raw.subject, &raw.html)?;
                Ok(Resolution::Content(EmailContent { html, ..raw }))
            }
        }
    }

    /// Visible error message sent in place of content that failed to generate.
    pub fn error_content(&self, key: &str, error: &TemplateError) -> EmailContent {
        let subject = format!("Template error: {}", key);
        let body = format!(
            "<h4>This message could not be generated</h4>\
             <p>The template <code>{}</code> failed with:</p>\
             <pre>{}</pre>",
            handlebars::html_escape(key),
            handlebars::html_escape(&error.to_string())
        );

        let html = match self.envelope.wrap(&subject, &body) {
            Ok(html) => html,
            Err(e) => {
                warn!(template = %key, error = %e, "envelope failed for error message");
                body
            }
        };
        EmailContent::new(subject, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator;
    use crate::metadata::{FieldSpec, TemplateMeta};
    use serde_json::json;

    fn resolver() -> TemplateResolver {
        let mut registry = TemplateRegistry::new();
        registry
            .register(
                "hello",
                TemplateMeta::new("Hello", "Greets").field(FieldSpec::text("name", "Name", "friend")),
                Generator::sync(|data| {
                    Ok(Generated::Content(
                        EmailContent::new("S", format!("<p>hi {}</p>", data["name"].as_str().unwrap_or("?")))
                            .attach("/reports/out.csv"),
                    ))
                }),
            )
            .register(
                "never",
                TemplateMeta::new("Never", "Always aborts"),
                Generator::future(|_data: Value| async { Ok(Generated::Abort) }),
            );
        TemplateResolver::new(Arc::new(registry), Envelope::new("Letterbox").unwrap())
    }

    #[tokio::test]
    async fn test_resolve_wraps_content() {
        let resolution = resolver().resolve("hello", &json!({})).await.unwrap();
        let Resolution::Content(content) = resolution else {
            panic!("expected content");
        };

        assert_eq!(content.subject, "S");
        assert!(content.html.contains("<p>hi friend</p>"));
        assert!(content.html.contains("<h1>S</h1>"));
        assert_eq!(content.attachments, vec![std::path::PathBuf::from("/reports/out.csv")]);
    }

    #[tokio::test]
    async fn test_abort_skips_envelope() {
        let resolution = resolver().resolve("never", &json!({})).await.unwrap();
        assert_eq!(resolution, Resolution::Abort);
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let result = resolver().resolve("nope", &json!({})).await;
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_error_content_is_escaped() {
        let content = resolver().error_content(
            "file_report",
            &TemplateError::Generation("missing <report.md>".to_string()),
        );
        assert_eq!(content.subject, "Template error: file_report");
        assert!(content.html.contains("missing &lt;report.md&gt;"));
    }
}
