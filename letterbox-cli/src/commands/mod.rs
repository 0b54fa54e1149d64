//! Command implementations.

pub mod jobs;
pub mod send;
pub mod serve;
pub mod templates;

use crate::ContentArgs;
use crate::error::CliResult;
use letterbox::DeliveryParams;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;
    Ok(())
}

/// Apply the shared content flags to delivery parameters.
fn with_content(mut params: DeliveryParams, content: &ContentArgs) -> DeliveryParams {
    if let Some(subject) = &content.subject {
        params = params.with_subject(subject.clone());
    }
    params.silent(content.silent)
}

fn template_data(content: &ContentArgs) -> Value {
    content
        .data
        .clone()
        .unwrap_or_else(|| Value::Object(Default::default()))
}
