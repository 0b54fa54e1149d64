//! Service wiring.

use crate::attachments::AttachmentLifecycle;
use crate::error::PipelineResult;
use crate::firing::{Dispatcher, register_handlers};
use crate::service::JobService;
use chrono::Utc;
use letterbox_config::Settings;
use letterbox_cron::{HandlerRegistry, JobStore, Scheduler, SchedulerConfig, SqliteJobStore};
use letterbox_mail::{
    DeliveryEngine, MailComposer, SenderPool, SmtpConfig, SmtpSecurity, SmtpTransport, Transport,
};
use letterbox_templates::{BuiltinConfig, Envelope, TemplateRegistry, TemplateResolver};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Pre-built collaborators for [`Letterbox::with_parts`].
pub struct Parts {
    pub store: Arc<dyn JobStore>,
    pub transport: Arc<dyn Transport>,
    pub senders: SenderPool,
    /// From-header display name, also shown in the message footer.
    pub sender_name: String,
    pub templates: TemplateRegistry,
    pub scheduler: SchedulerConfig,
    pub upload_dir: PathBuf,
}

/// A wired pipeline: store, scheduler, templates and delivery.
pub struct Letterbox {
    scheduler: Arc<Scheduler>,
    service: Arc<JobService>,
}

impl Letterbox {
    /// Build from settings: SQLite store, SMTP transport, built-in templates.
    pub fn from_settings(settings: &Settings) -> PipelineResult<Self> {
        let timezone = settings.timezone()?;

        let security: SmtpSecurity = settings.smtp_security.parse()?;
        let smtp = SmtpConfig::new(settings.smtp_host.as_str())
            .port(settings.smtp_port)
            .security(security)
            .timeout(settings.smtp_timeout());

        let templates = TemplateRegistry::with_builtins(&BuiltinConfig {
            report_dir: settings
                .report_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("reports")),
            timezone,
        })?;

        Self::with_parts(Parts {
            store: Arc::new(SqliteJobStore::open(&settings.database_path)?),
            transport: Arc::new(SmtpTransport::new(smtp)),
            senders: SenderPool::parse(&settings.sender_accounts)?,
            sender_name: settings.sender_name.clone(),
            templates,
            scheduler: SchedulerConfig {
                tick_interval: settings.tick_interval(),
                timezone,
            },
            upload_dir: settings.upload_dir.clone(),
        })
    }

    pub fn with_parts(parts: Parts) -> PipelineResult<Self> {
        let envelope = Envelope::new(parts.sender_name.as_str())?;
        let resolver = Arc::new(TemplateResolver::new(Arc::new(parts.templates), envelope));
        let engine = Arc::new(DeliveryEngine::new(
            parts.senders,
            MailComposer::new(parts.sender_name),
            parts.transport,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            resolver,
            engine,
            AttachmentLifecycle::new(parts.upload_dir),
        ));

        let mut handlers = HandlerRegistry::new();
        register_handlers(&mut handlers, dispatcher.clone());

        let scheduler = Arc::new(Scheduler::with_config(parts.store, handlers, parts.scheduler));
        let service = Arc::new(JobService::new(scheduler.clone(), dispatcher));
        Ok(Self { scheduler, service })
    }

    pub fn service(&self) -> &Arc<JobService> {
        &self.service
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Re-arm stored jobs from now, then fire due jobs until `shutdown` is set.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> PipelineResult<()> {
        let jobs = self.scheduler.rearm(Utc::now()).await?;
        info!(jobs, "letterbox starting");
        self.scheduler.clone().run(shutdown).await;
        info!("letterbox stopped");
        Ok(())
    }
}
