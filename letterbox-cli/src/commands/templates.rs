//! Print the template catalogue.

use super::print_json;
use crate::error::CliResult;
use letterbox::config::Settings;
use letterbox::templates::{BuiltinConfig, TemplateRegistry};
use std::path::PathBuf;

pub fn run(settings: &Settings) -> CliResult<()> {
    let registry = TemplateRegistry::with_builtins(&BuiltinConfig {
        report_dir: settings
            .report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("reports")),
        timezone: settings.timezone()?,
    })
    .map_err(letterbox::PipelineError::from)?;

    print_json(&registry.metadata())
}
