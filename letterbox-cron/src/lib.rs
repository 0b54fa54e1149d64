//! Durable job scheduling for Letterbox.
//!
//! Jobs pair a [`Trigger`] (a one-shot instant or a five-field cron
//! expression evaluated in an IANA timezone) with the name of a registered
//! handler and a JSON parameter blob. Jobs live in a [`JobStore`] so that
//! they survive restarts; [`SqliteJobStore`] is the production store.
//!
//! ## Cron expressions
//!
//! ```
//! use letterbox_cron::{CronExpression, CronPresets};
//!
//! let expr = CronExpression::parse(CronPresets::WEEKDAYS_9AM).unwrap();
//! let now = chrono::Utc::now().with_timezone(&chrono_tz::Asia::Taipei);
//! assert!(expr.next_after(&now).unwrap() > now);
//! ```
//!
//! ## Running a scheduler
//!
//! ```no_run
//! use letterbox_cron::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CronError> {
//!     let mut handlers = HandlerRegistry::new();
//!     handlers.register("ping", |ctx| async move {
//!         println!("firing {}", ctx.job_name);
//!         Ok(())
//!     });
//!
//!     let store = Arc::new(SqliteJobStore::open("jobs.db")?);
//!     let scheduler = Arc::new(Scheduler::new(store, handlers));
//!
//!     let trigger = Trigger::cron("*/5 * * * *", chrono_tz::UTC)?;
//!     scheduler
//!         .schedule(Job::new("ping", trigger, "ping", serde_json::json!({})))
//!         .await?;
//!
//!     let (_tx, rx) = tokio::sync::watch::channel(false);
//!     scheduler.run(rx).await;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod expression;
pub mod job;
pub mod registry;
pub mod scheduler;
pub mod sqlite;
pub mod store;
pub mod trigger;

pub use error::{CronError, CronResult};
pub use expression::{CronExpression, CronPresets};
pub use job::{FiringContext, Job};
pub use registry::{HandlerRegistry, JobHandler};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use sqlite::SqliteJobStore;
pub use store::{JobEdit, JobStore, MemoryJobStore};
pub use trigger::{RUN_AT_FORMAT, Trigger, TriggerKind};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CronError, CronResult};
    pub use crate::job::{FiringContext, Job};
    pub use crate::registry::HandlerRegistry;
    pub use crate::scheduler::{Scheduler, SchedulerConfig};
    pub use crate::store::{JobStore, MemoryJobStore};
    pub use crate::trigger::{Trigger, TriggerKind};
}
