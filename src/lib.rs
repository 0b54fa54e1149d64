//! Letterbox: scheduled, templated email delivery.
//!
//! Jobs are stored durably and fire either once or on a five-field cron
//! schedule. Each firing resolves a template into an [`EmailContent`], sends
//! it to every recipient concurrently and then deletes the job's temporary
//! uploads.
//!
//! ```no_run
//! use letterbox::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> PipelineResult<()> {
//! let settings = Settings::load()?;
//! let letterbox = Letterbox::from_settings(&settings)?;
//!
//! let job = letterbox
//!     .service()
//!     .create_cron(CronJobRequest {
//!         id: None,
//!         name: "Monday motivation".to_string(),
//!         expression: "0 9 * * 1".to_string(),
//!         params: DeliveryParams::many(["team@example.com"], "motivational_quote", json!({})),
//!     })
//!     .await?;
//! println!("next run: {:?}", job.next_fire_time);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod attachments;
pub mod error;
pub mod firing;
pub mod params;
pub mod service;

pub use app::{Letterbox, Parts};
pub use attachments::AttachmentLifecycle;
pub use error::{PipelineError, PipelineResult};
pub use firing::{Dispatcher, register_handlers};
pub use params::{
    DeliveryParams, SEND_ONE_EMAIL, SEND_TO_MANY, normalize_recipient, normalize_recipients,
};
pub use service::{CronJobRequest, JobService, JobUpdate, JobView, OnceJobRequest, RunAt};

pub use letterbox_config as config;
pub use letterbox_cron as cron;
pub use letterbox_mail as mail;
pub use letterbox_templates as templates;

pub use letterbox_mail::{DeliveryOutcome, EmailContent};

/// Common imports.
pub mod prelude {
    pub use crate::{
        AttachmentLifecycle, CronJobRequest, DeliveryOutcome, DeliveryParams, EmailContent,
        JobService, JobUpdate, JobView, Letterbox, OnceJobRequest, Parts, PipelineError,
        PipelineResult, RunAt,
    };
    pub use letterbox_config::Settings;
    pub use letterbox_cron::{SchedulerConfig, TriggerKind};
}
