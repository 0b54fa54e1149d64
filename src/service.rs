//! Job operations: create, update, cancel, list, get, send now.

use crate::error::{PipelineError, PipelineResult};
use crate::firing::Dispatcher;
use crate::params::{
    DeliveryParams, SEND_ONE_EMAIL, SEND_TO_MANY, normalize_recipient, normalize_recipients,
};
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use letterbox_cron::{CronError, Job, Scheduler, Trigger, TriggerKind};
use letterbox_mail::DeliveryOutcome;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// When a one-shot job runs.
#[derive(Debug, Clone, PartialEq)]
pub enum RunAt {
    /// An absolute instant.
    Instant(DateTime<Utc>),
    /// `YYYY-MM-DD HH:MM` wall-clock time in the service timezone.
    Local(String),
}

impl From<DateTime<Utc>> for RunAt {
    fn from(at: DateTime<Utc>) -> Self {
        RunAt::Instant(at)
    }
}

impl From<&str> for RunAt {
    fn from(local: &str) -> Self {
        RunAt::Local(local.to_string())
    }
}

impl From<String> for RunAt {
    fn from(local: String) -> Self {
        RunAt::Local(local)
    }
}

/// Request for a one-shot job. `params.recipient` is required.
#[derive(Debug, Clone)]
pub struct OnceJobRequest {
    /// Replaces the job with this id if it exists.
    pub id: Option<String>,
    pub run_at: RunAt,
    pub params: DeliveryParams,
}

/// Request for a recurring job. `params.recipients` is required.
#[derive(Debug, Clone)]
pub struct CronJobRequest {
    pub id: Option<String>,
    pub name: String,
    /// Five fields: minute hour day month day-of-week.
    pub expression: String,
    pub params: DeliveryParams,
}

/// Fields to change on an existing job. `None` keeps the stored value.
///
/// `run_at` and `recipient` apply to one-shot jobs, `expression` and
/// `recipients` to cron jobs. An empty `custom_subject` clears it.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub name: Option<String>,
    pub run_at: Option<RunAt>,
    pub expression: Option<String>,
    pub recipient: Option<String>,
    pub recipients: Option<Vec<String>>,
    pub template_key: Option<String>,
    pub template_data: Option<Value>,
    pub custom_subject: Option<String>,
    pub silent_run: Option<bool>,
}

/// Caller-facing projection of a stored job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: String,
    pub name: String,
    pub trigger_kind: TriggerKind,
    pub trigger: String,
    /// In the service timezone.
    pub next_fire_time: Option<DateTime<FixedOffset>>,
    pub last_fired: Option<DateTime<FixedOffset>>,
    pub parameters: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobView {
    pub fn new(job: &Job, tz: Tz) -> Self {
        let local = |at: DateTime<Utc>| at.with_timezone(&tz).fixed_offset();
        Self {
            id: job.id.clone(),
            name: job.name.clone(),
            trigger_kind: job.kind(),
            trigger: job.trigger.describe(),
            next_fire_time: job.next_fire.map(local),
            last_fired: job.last_fired.map(local),
            parameters: job.params.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// The operation surface over the scheduler and the dispatcher.
pub struct JobService {
    scheduler: Arc<Scheduler>,
    dispatcher: Arc<Dispatcher>,
}

impl JobService {
    pub fn new(scheduler: Arc<Scheduler>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            scheduler,
            dispatcher,
        }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn timezone(&self) -> Tz {
        self.scheduler.timezone()
    }

    fn view(&self, job: &Job) -> JobView {
        JobView::new(job, self.timezone())
    }

    fn check_template(&self, key: &str) -> PipelineResult<()> {
        if self.dispatcher.resolver().registry().contains(key) {
            Ok(())
        } else {
            Err(PipelineError::validation(format!("unknown template {:?}", key)))
        }
    }

    fn once_trigger(&self, run_at: &RunAt) -> PipelineResult<Trigger> {
        let tz = self.timezone();
        Ok(match run_at {
            RunAt::Instant(at) => Trigger::once(*at, tz),
            RunAt::Local(local) => Trigger::once_local(local, tz)?,
        })
    }

    fn cron_trigger(&self, expression: &str) -> PipelineResult<Trigger> {
        let trigger = Trigger::cron(expression, self.timezone())?;
        if trigger.next_fire(Utc::now())?.is_none() {
            return Err(PipelineError::validation(format!(
                "cron expression {:?} never fires",
                expression
            )));
        }
        Ok(trigger)
    }

    fn validate_once(&self, mut params: DeliveryParams) -> PipelineResult<DeliveryParams> {
        self.check_template(&params.template_key)?;
        self.dispatcher
            .attachments()
            .check_owned(&params.temp_attachments)?;
        let recipient = params
            .recipient
            .as_deref()
            .ok_or_else(|| PipelineError::validation("recipient is required"))?;
        params.recipient = Some(normalize_recipient(recipient)?);
        params.recipients.clear();
        Ok(params)
    }

    fn validate_cron(&self, mut params: DeliveryParams) -> PipelineResult<DeliveryParams> {
        self.check_template(&params.template_key)?;
        if !params.temp_attachments.is_empty() {
            return Err(PipelineError::validation(
                "temporary attachments are only supported on one-shot jobs",
            ));
        }
        params.recipients = normalize_recipients(&params.recipients)?;
        params.recipient = None;
        Ok(params)
    }

    /// The stored job `id` refers to, if any.
    async fn existing(&self, id: Option<&str>) -> PipelineResult<Option<Job>> {
        let Some(id) = id else {
            return Ok(None);
        };
        match self.scheduler.get(id).await {
            Ok(job) => Ok(Some(job)),
            Err(CronError::JobNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Release uploads of a job that will never fire, except those in `keep`.
    async fn release_uploads(&self, job: &Job, keep: &[PathBuf]) {
        let uploads: Vec<PathBuf> = DeliveryParams::from_value(&job.params)
            .map(|params| params.temp_attachments)
            .unwrap_or_default()
            .into_iter()
            .filter(|path| !keep.contains(path))
            .collect();

        if !uploads.is_empty() {
            debug!(job_id = %job.id, count = uploads.len(), "releasing uploads of a retired job");
            self.dispatcher.attachments().release(&uploads).await;
        }
    }

    /// CreateOnceJob.
    ///
    /// Replacing a job releases the uploads the replacement no longer carries.
    pub async fn create_once(&self, request: OnceJobRequest) -> PipelineResult<JobView> {
        let trigger = self.once_trigger(&request.run_at)?;
        let params = self.validate_once(request.params)?;
        let name = format!(
            "{} to {}",
            params.template_key,
            params.recipient.as_deref().unwrap_or_default()
        );
        let previous = self.existing(request.id.as_deref()).await?;

        let job = match request.id {
            Some(id) => Job::with_id(id, name, trigger, SEND_ONE_EMAIL, params.to_value()),
            None => Job::new(name, trigger, SEND_ONE_EMAIL, params.to_value()),
        };
        let job = self.scheduler.schedule(job).await?;

        if let Some(previous) = previous {
            self.release_uploads(&previous, &params.temp_attachments).await;
        }
        Ok(self.view(&job))
    }

    /// CreateCronJob.
    pub async fn create_cron(&self, request: CronJobRequest) -> PipelineResult<JobView> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(PipelineError::validation("job name is required"));
        }
        let trigger = self.cron_trigger(&request.expression)?;
        let params = self.validate_cron(request.params)?;
        let previous = self.existing(request.id.as_deref()).await?;

        let job = match request.id {
            Some(id) => Job::with_id(id, name, trigger, SEND_TO_MANY, params.to_value()),
            None => Job::new(name, trigger, SEND_TO_MANY, params.to_value()),
        };
        let job = self.scheduler.schedule(job).await?;

        if let Some(previous) = previous {
            self.release_uploads(&previous, &[]).await;
        }
        Ok(self.view(&job))
    }

    /// UpdateJob: change only the supplied fields, keeping the id.
    pub async fn update(&self, id: &str, update: JobUpdate) -> PipelineResult<JobView> {
        let kind = self.scheduler.get(id).await?.kind();

        let mut trigger = None;
        let mut recipient = None;
        let mut recipients = None;
        match kind {
            TriggerKind::Once => {
                if update.expression.is_some() || update.recipients.is_some() {
                    return Err(PipelineError::validation(
                        "one-shot jobs take run_at and a single recipient",
                    ));
                }
                if let Some(run_at) = &update.run_at {
                    trigger = Some(self.once_trigger(run_at)?);
                }
                if let Some(to) = &update.recipient {
                    recipient = Some(normalize_recipient(to)?);
                }
            }
            TriggerKind::Cron => {
                if update.run_at.is_some() || update.recipient.is_some() {
                    return Err(PipelineError::validation(
                        "cron jobs take an expression and a recipient list",
                    ));
                }
                if let Some(expression) = &update.expression {
                    trigger = Some(self.cron_trigger(expression)?);
                }
                if let Some(list) = &update.recipients {
                    recipients = Some(normalize_recipients(list)?);
                }
            }
        }
        if let Some(key) = &update.template_key {
            self.check_template(key)?;
        }
        let name = match update.name {
            Some(name) if name.trim().is_empty() => {
                return Err(PipelineError::validation("job name cannot be empty"));
            }
            other => other.map(|name| name.trim().to_string()),
        };
        let JobUpdate {
            template_key,
            template_data,
            custom_subject,
            silent_run,
            ..
        } = update;

        // Applied to the stored record inside the store's transaction.
        let job = self
            .scheduler
            .reschedule(
                id,
                Box::new(move |job| {
                    let mut params: DeliveryParams = serde_json::from_value(job.params.clone())?;
                    if let Some(to) = recipient {
                        params.recipient = Some(to);
                    }
                    if let Some(list) = recipients {
                        params.recipients = list;
                    }
                    if let Some(key) = template_key {
                        params.template_key = key;
                    }
                    if let Some(data) = template_data {
                        params.template_data = data;
                    }
                    if let Some(subject) = custom_subject {
                        params.custom_subject = Some(subject).filter(|s| !s.trim().is_empty());
                    }
                    if let Some(silent) = silent_run {
                        params.silent_run = silent;
                    }
                    if let Some(trigger) = trigger {
                        job.trigger = trigger;
                    }
                    if let Some(name) = name {
                        job.name = name;
                    }
                    job.params = serde_json::to_value(&params)?;
                    Ok(())
                }),
            )
            .await?;

        Ok(self.view(&job))
    }

    /// CancelJob. A cancelled one-shot job takes its uploads with it.
    pub async fn cancel(&self, id: &str) -> PipelineResult<()> {
        let job = self.scheduler.get(id).await?;
        self.scheduler.cancel(id).await?;
        self.release_uploads(&job, &[]).await;
        Ok(())
    }

    /// ListJobs, soonest first.
    pub async fn list(&self) -> PipelineResult<Vec<JobView>> {
        let jobs = self.scheduler.list().await?;
        Ok(jobs.iter().map(|job| self.view(job)).collect())
    }

    /// GetJob.
    pub async fn get(&self, id: &str) -> PipelineResult<JobView> {
        let job = self.scheduler.get(id).await?;
        Ok(self.view(&job))
    }

    /// SendNow: one firing without a job record.
    ///
    /// Temporary attachments are released even when the request is rejected.
    pub async fn send_now(&self, params: DeliveryParams) -> PipelineResult<Vec<DeliveryOutcome>> {
        let uploads = params.temp_attachments.clone();
        let params = match self.validate_once(params) {
            Ok(params) => params,
            Err(e) => {
                self.dispatcher.attachments().release(&uploads).await;
                return Err(e);
            }
        };
        let targets: Vec<String> = params.recipient.iter().cloned().collect();

        debug!(template = %params.template_key, "sending now");
        let outcomes = self.dispatcher.fire("send-now", &targets, &params).await;
        info!(
            template = %params.template_key,
            sent = outcomes.iter().filter(|o| o.success).count(),
            "send now finished"
        );
        Ok(outcomes)
    }
}
