//! `letterbox jobs ...`

use super::{print_json, template_data, with_content};
use crate::error::{CliError, CliResult};
use crate::{CronArgs, JobsCommand, OnceArgs, UpdateArgs};
use letterbox::config::Settings;
use letterbox::cron::TriggerKind;
use letterbox::{
    CronJobRequest, DeliveryParams, JobService, JobUpdate, Letterbox, OnceJobRequest, RunAt,
};
use serde_json::json;
use std::path::PathBuf;

pub async fn run(settings: &Settings, command: JobsCommand) -> CliResult<()> {
    let letterbox = Letterbox::from_settings(settings)?;
    let service = letterbox.service();

    match command {
        JobsCommand::List => print_json(&service.list().await?),
        JobsCommand::Get { id } => print_json(&service.get(&id).await?),
        JobsCommand::Cancel { id } => {
            service.cancel(&id).await?;
            print_json(&json!({ "cancelled": id }))
        }
        JobsCommand::Once(args) => create_once(service, args).await,
        JobsCommand::Cron(args) => create_cron(service, args).await,
        JobsCommand::Update(args) => update(service, args).await,
    }
}

/// Copy local files into the upload directory.
///
/// On failure, files staged so far are removed again.
pub async fn stage_all(service: &JobService, sources: &[PathBuf]) -> CliResult<Vec<PathBuf>> {
    let attachments = service.dispatcher().attachments();
    let mut staged = Vec::with_capacity(sources.len());

    for source in sources {
        match attachments.stage(source).await {
            Ok(path) => staged.push(path),
            Err(e) => {
                attachments.release(&staged).await;
                return Err(e.into());
            }
        }
    }
    Ok(staged)
}

async fn create_once(service: &JobService, args: OnceArgs) -> CliResult<()> {
    let staged = stage_all(service, &args.attachments).await?;
    let params = DeliveryParams::one(
        args.to.as_str(),
        args.content.template.as_str(),
        template_data(&args.content),
    )
    .with_attachments(staged.clone());

    let request = OnceJobRequest {
        id: args.id,
        run_at: RunAt::Local(args.at),
        params: with_content(params, &args.content),
    };

    match service.create_once(request).await {
        Ok(view) => print_json(&view),
        Err(e) => {
            // Nothing will fire for a rejected job
            service.dispatcher().attachments().release(&staged).await;
            Err(e.into())
        }
    }
}

async fn create_cron(service: &JobService, args: CronArgs) -> CliResult<()> {
    let params = DeliveryParams::many(
        args.to,
        args.content.template.as_str(),
        template_data(&args.content),
    );

    let request = CronJobRequest {
        id: args.id,
        name: args.name,
        expression: args.expression,
        params: with_content(params, &args.content),
    };

    print_json(&service.create_cron(request).await?)
}

async fn update(service: &JobService, args: UpdateArgs) -> CliResult<()> {
    let mut update = JobUpdate {
        name: args.name,
        run_at: args.at.map(RunAt::Local),
        expression: args.expression,
        template_key: args.template,
        template_data: args.data,
        custom_subject: args.subject,
        silent_run: args.silent,
        ..JobUpdate::default()
    };

    if !args.to.is_empty() {
        match service.get(&args.id).await?.trigger_kind {
            TriggerKind::Once => {
                let [recipient] = <[String; 1]>::try_from(args.to).map_err(|_| {
                    CliError::InvalidArgument("one-shot jobs take a single --to".to_string())
                })?;
                update.recipient = Some(recipient);
            }
            TriggerKind::Cron => update.recipients = Some(args.to),
        }
    }

    print_json(&service.update(&args.id, update).await?)
}
