//! Job firings: template resolution, fan-out delivery, attachment cleanup.

use crate::attachments::AttachmentLifecycle;
use crate::params::{DeliveryParams, SEND_ONE_EMAIL, SEND_TO_MANY};
use futures::FutureExt;
use futures::future::join_all;
use letterbox_cron::{CronError, CronResult, FiringContext, HandlerRegistry};
use letterbox_mail::{DeliveryEngine, DeliveryOutcome, EmailContent};
use letterbox_templates::{Resolution, TemplateResolver};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs firings for the delivery handlers.
///
/// A firing resolves its template once, sends the result to every target
/// concurrently and waits for all of them. Temporary attachments are released
/// afterwards whatever happened, including a panic inside the template or the
/// transport.
pub struct Dispatcher {
    resolver: Arc<TemplateResolver>,
    engine: Arc<DeliveryEngine>,
    attachments: AttachmentLifecycle,
}

impl Dispatcher {
    pub fn new(
        resolver: Arc<TemplateResolver>,
        engine: Arc<DeliveryEngine>,
        attachments: AttachmentLifecycle,
    ) -> Self {
        Self {
            resolver,
            engine,
            attachments,
        }
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    pub fn attachments(&self) -> &AttachmentLifecycle {
        &self.attachments
    }

    /// Run one firing for `targets`. `label` names the firing in logs.
    pub async fn fire(
        &self,
        label: &str,
        targets: &[String],
        params: &DeliveryParams,
    ) -> Vec<DeliveryOutcome> {
        let run = AssertUnwindSafe(self.run(label, targets, params))
            .catch_unwind()
            .await;

        self.attachments.release(&params.temp_attachments).await;

        match run {
            Ok(outcomes) => outcomes,
            Err(panic) => {
                error!(job = %label, panic = %panic_message(&*panic), "firing panicked");
                Vec::new()
            }
        }
    }

    async fn run(
        &self,
        label: &str,
        targets: &[String],
        params: &DeliveryParams,
    ) -> Vec<DeliveryOutcome> {
        let key = params.template_key.as_str();

        let content = match self.resolver.resolve(key, &params.template_data).await {
            Ok(Resolution::Abort) => {
                info!(job = %label, template = %key, "template aborted the firing");
                return Vec::new();
            }
            Ok(Resolution::Content(_)) if params.silent_run => {
                info!(job = %label, template = %key, "silent run finished, nothing sent");
                return Vec::new();
            }
            Ok(Resolution::Content(content)) => assemble(content, params),
            Err(e) if params.silent_run => {
                error!(job = %label, template = %key, error = %e, "template failed during silent run");
                return Vec::new();
            }
            Err(e) => {
                error!(job = %label, template = %key, error = %e, "template failed, sending error notice");
                self.resolver.error_content(key, &e)
            }
        };

        if targets.is_empty() {
            warn!(job = %label, "firing has no recipients");
            return Vec::new();
        }

        let outcomes = join_all(targets.iter().map(|to| self.engine.send(to, &content))).await;
        let delivered = outcomes.iter().filter(|o| o.success).count();
        info!(
            job = %label,
            subject = %content.subject,
            delivered,
            failed = outcomes.len() - delivered,
            "firing complete"
        );
        outcomes
    }

    /// Handler for [`SEND_ONE_EMAIL`] jobs.
    pub async fn send_one(&self, ctx: FiringContext) -> CronResult<()> {
        let params = self.decode(&ctx).await?;
        let targets: Vec<String> = params.recipient.iter().cloned().collect();
        self.fire(&ctx.job_id, &targets, &params).await;
        Ok(())
    }

    /// Handler for [`SEND_TO_MANY`] jobs.
    pub async fn send_to_many(&self, ctx: FiringContext) -> CronResult<()> {
        let params = self.decode(&ctx).await?;
        self.fire(&ctx.job_id, &params.recipients, &params).await;
        Ok(())
    }

    async fn decode(&self, ctx: &FiringContext) -> CronResult<DeliveryParams> {
        match DeliveryParams::from_value(&ctx.params) {
            Ok(params) => Ok(params),
            Err(e) => {
                // Uploads still belong to this firing.
                self.attachments
                    .release(&stray_attachments(&ctx.params))
                    .await;
                Err(CronError::ExecutionFailed(e.to_string()))
            }
        }
    }
}

/// Final subject and attachment list.
fn assemble(mut content: EmailContent, params: &DeliveryParams) -> EmailContent {
    if let Some(subject) = params.subject_override() {
        content.subject = subject.to_string();
    }
    content
        .attachments
        .extend(params.temp_attachments.iter().cloned());
    content
}

fn stray_attachments(params: &Value) -> Vec<PathBuf> {
    params
        .get("temp_attachments")
        .and_then(Value::as_array)
        .map(|paths| {
            paths
                .iter()
                .filter_map(Value::as_str)
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_default()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Register the delivery handlers under their stored names.
pub fn register_handlers(registry: &mut HandlerRegistry, dispatcher: Arc<Dispatcher>) {
    let one = dispatcher.clone();
    registry.register(SEND_ONE_EMAIL, move |ctx| {
        let dispatcher = one.clone();
        async move { dispatcher.send_one(ctx).await }
    });

    registry.register(SEND_TO_MANY, move |ctx| {
        let dispatcher = dispatcher.clone();
        async move { dispatcher.send_to_many(ctx).await }
    });
}
