//! `file_report`: mails a text or markdown report read from disk.

use crate::BuiltinConfig;
use crate::data::TemplateData;
use crate::error::{TemplateError, TemplateResult};
use crate::generator::{Generated, Generator};
use crate::metadata::{FieldSpec, TemplateMeta};
use crate::registry::TemplateRegistry;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use letterbox_mail::EmailContent;
use serde_json::Value;
use std::fmt::Write;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

pub(crate) fn register(registry: &mut TemplateRegistry, config: &BuiltinConfig) {
    let tz = config.timezone;
    let meta = TemplateMeta::new(
        "Scheduled report",
        "Reads a report file and sends its text. The filename may contain date \
         patterns such as %Y-%m-%d, expanded on the day the job fires.",
    )
    .field(FieldSpec::text(
        "report_folder",
        "Report folder",
        &config.report_dir.to_string_lossy(),
    ))
    .field(FieldSpec::text("report_filename", "Report filename", "weekly_report.md"))
    .field(FieldSpec::text(
        "skip_if_missing",
        "Skip quietly when the file is missing (true/false)",
        "false",
    ));

    registry.register(
        "file_report",
        meta,
        Generator::future(move |data: Value| generate(data, Utc::now().with_timezone(&tz))),
    );
}

async fn generate(data: Value, now: DateTime<Tz>) -> TemplateResult<Generated> {
    let input = TemplateData::new(&data);
    let folder = PathBuf::from(input.text("report_folder", "reports").trim());
    let pattern = input.text("report_filename", "");
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(TemplateError::Generation(
            "report_filename must name a file".to_string(),
        ));
    }

    let filename = dated_filename(pattern, &now)?;
    let path = folder.join(&filename);
    debug!(path = %path.display(), "reading report");

    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if input.flag("skip_if_missing") {
                info!(path = %path.display(), "report not found, skipping this run");
                return Ok(Generated::Abort);
            }
            return Err(TemplateError::Generation(format!(
                "report file not found: {}",
                path.display()
            )));
        }
        Err(e) => {
            return Err(TemplateError::Generation(format!(
                "could not read {}: {}",
                path.display(),
                e
            )));
        }
    };

    let heading = text
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('#')
        .trim();
    let title = if heading.is_empty() { filename.as_str() } else { heading };

    Ok(Generated::Content(EmailContent::new(
        format!("Scheduled report - {}", title),
        format!("<pre>{}</pre>", handlebars::html_escape(&text)),
    )))
}

/// Expand strftime patterns in `pattern`, if it has any.
fn dated_filename(pattern: &str, now: &DateTime<Tz>) -> TemplateResult<String> {
    if !pattern.contains('%') {
        return Ok(pattern.to_string());
    }
    let mut name = String::new();
    write!(name, "{}", now.format(pattern)).map_err(|_| {
        TemplateError::Generation(format!("invalid date pattern in filename {:?}", pattern))
    })?;
    Ok(name)
}
