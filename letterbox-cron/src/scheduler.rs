//! Job scheduler.

use crate::error::{CronError, CronResult};
use crate::job::{FiringContext, Job};
use crate::registry::HandlerRegistry;
use crate::store::{JobEdit, JobStore};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often due jobs are polled
    pub tick_interval: Duration,

    /// Default timezone for new triggers
    pub timezone: Tz,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            timezone: chrono_tz::UTC,
        }
    }
}

/// Persistent job scheduler.
///
/// Due jobs are dispatched to their handler on a spawned task, so a slow or
/// failing firing never delays the poll loop or other jobs. A one-shot job is
/// deleted as soon as it is dispatched; a cron job is re-armed from the
/// dispatch time.
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    handlers: Arc<HandlerRegistry>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(store: Arc<dyn JobStore>, handlers: HandlerRegistry) -> Self {
        Self::with_config(store, handlers, SchedulerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn JobStore>,
        handlers: HandlerRegistry,
        config: SchedulerConfig,
    ) -> Self {
        debug!(
            tick_interval = ?config.tick_interval,
            timezone = %config.timezone,
            handlers = ?handlers.names(),
            "scheduler configured"
        );
        Self {
            store,
            handlers: Arc::new(handlers),
            config,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    fn check_handler(handlers: &HandlerRegistry, name: &str) -> CronResult<()> {
        if handlers.contains(name) {
            Ok(())
        } else {
            Err(CronError::UnknownHandler(name.to_string()))
        }
    }

    /// Store a job, replacing any job with the same id.
    pub async fn schedule(&self, mut job: Job) -> CronResult<Job> {
        Self::check_handler(&self.handlers, &job.handler)?;

        let now = Utc::now();
        job.next_fire = job.trigger.next_fire(now)?;
        job.updated_at = now;
        if job.next_fire.is_none() {
            warn!(job_id = %job.id, trigger = %job.trigger, "trigger never fires");
        }

        self.store.upsert(&job).await?;
        info!(
            job_id = %job.id,
            name = %job.name,
            trigger = %job.trigger,
            next_fire = ?job.next_fire,
            "job scheduled"
        );
        Ok(job)
    }

    /// Edit a stored job in place.
    ///
    /// The next fire time is recomputed when the trigger changes.
    pub async fn reschedule(&self, id: &str, edit: JobEdit) -> CronResult<Job> {
        let handlers = self.handlers.clone();
        let now = Utc::now();

        let job = self
            .store
            .modify(
                id,
                Box::new(move |job| {
                    let previous = job.trigger.clone();
                    edit(job)?;
                    Self::check_handler(&handlers, &job.handler)?;
                    if job.trigger != previous || job.next_fire.is_none() {
                        job.next_fire = job.trigger.next_fire(now)?;
                    }
                    job.updated_at = now;
                    Ok(())
                }),
            )
            .await?;

        info!(job_id = %job.id, trigger = %job.trigger, next_fire = ?job.next_fire, "job updated");
        Ok(job)
    }

    /// Remove a job so it never fires again.
    pub async fn cancel(&self, id: &str) -> CronResult<()> {
        if !self.store.remove(id).await? {
            return Err(CronError::JobNotFound(id.to_string()));
        }
        info!(job_id = %id, "job cancelled");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> CronResult<Job> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CronError::JobNotFound(id.to_string()))
    }

    /// All stored jobs, soonest first.
    pub async fn list(&self) -> CronResult<Vec<Job>> {
        self.store.list().await
    }

    /// Recompute every job's next fire time from `now`.
    ///
    /// Cron occurrences missed while the service was down are skipped; a
    /// one-shot job whose time has passed stays due and fires on the next tick.
    pub async fn rearm(&self, now: DateTime<Utc>) -> CronResult<usize> {
        let mut count = 0;
        for job in self.store.list().await? {
            let result = self
                .store
                .modify(
                    &job.id,
                    Box::new(move |job| {
                        job.next_fire = job.trigger.next_fire(now)?;
                        Ok(())
                    }),
                )
                .await;

            match result {
                Ok(job) => {
                    debug!(job_id = %job.id, next_fire = ?job.next_fire, "job re-armed");
                    count += 1;
                }
                Err(CronError::JobNotFound(_)) => {}
                Err(e) => warn!(job_id = %job.id, error = %e, "could not re-arm job"),
            }
        }
        info!(jobs = count, "scheduler re-armed");
        Ok(count)
    }

    /// Dispatch every job due at `now`.
    ///
    /// Returns the handles of the spawned firings.
    pub async fn tick(&self, now: DateTime<Utc>) -> CronResult<Vec<JoinHandle<()>>> {
        let due = self.store.due(now).await?;
        let mut handles = Vec::with_capacity(due.len());
        for job in due {
            handles.push(self.dispatch(job, now).await);
        }
        Ok(handles)
    }

    async fn dispatch(&self, job: Job, now: DateTime<Utc>) -> JoinHandle<()> {
        let ctx = FiringContext::new(&job, now);

        let handle = match self.handlers.get(&job.handler) {
            Some(handler) => {
                info!(job_id = %job.id, name = %job.name, handler = %job.handler, "firing job");
                tokio::spawn(async move {
                    let job_id = ctx.job_id.clone();
                    let delay = ctx.delay();
                    match handler(ctx).await {
                        Ok(()) => debug!(job_id = %job_id, delay_ms = delay.num_milliseconds(), "job firing finished"),
                        Err(e) => error!(job_id = %job_id, error = %e, "job firing failed"),
                    }
                })
            }
            None => {
                error!(job_id = %job.id, handler = %job.handler, "no handler registered, firing skipped");
                tokio::spawn(async {})
            }
        };

        if job.trigger.is_recurring() {
            let rearmed = self
                .store
                .modify(
                    &job.id,
                    Box::new(move |job| {
                        job.last_fired = Some(now);
                        job.next_fire = job.trigger.next_fire(now)?;
                        Ok(())
                    }),
                )
                .await;
            match rearmed {
                Ok(job) => debug!(job_id = %job.id, next_fire = ?job.next_fire, "cron job re-armed"),
                Err(CronError::JobNotFound(_)) => debug!(job_id = %job.id, "job cancelled while firing"),
                Err(e) => error!(job_id = %job.id, error = %e, "could not re-arm cron job"),
            }
        } else if let Err(e) = self.store.remove(&job.id).await {
            error!(job_id = %job.id, error = %e, "could not remove fired one-shot job");
        }

        handle
    }

    /// Poll for due jobs until `shutdown` broadcasts `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(tick_interval = ?self.config.tick_interval, "scheduler started");

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!(error = %e, "scheduler tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryJobStore;
    use crate::trigger::Trigger;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_registry(counter: Arc<AtomicUsize>) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register("count", move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        registry
    }

    #[tokio::test]
    async fn test_schedule_rejects_unknown_handler() {
        let scheduler = Scheduler::new(Arc::new(MemoryJobStore::new()), HandlerRegistry::new());
        let job = Job::new("x", Trigger::once(Utc::now(), chrono_tz::UTC), "nope", json!({}));
        let result = scheduler.schedule(job).await;
        assert!(matches!(result, Err(CronError::UnknownHandler(_))));
    }

    #[tokio::test]
    async fn test_once_job_fires_and_disappears() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(
            Arc::new(MemoryJobStore::new()),
            counting_registry(counter.clone()),
        );

        let past = Utc::now() - chrono::Duration::minutes(1);
        let job = scheduler
            .schedule(Job::new("once", Trigger::once(past, chrono_tz::UTC), "count", json!({})))
            .await
            .unwrap();

        for handle in scheduler.tick(Utc::now()).await.unwrap() {
            handle.await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(scheduler.get(&job.id).await, Err(CronError::JobNotFound(_))));

        // Nothing left to fire
        assert!(scheduler.tick(Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cron_job_rearmed_after_firing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryJobStore::new());
        let scheduler = Scheduler::new(store.clone(), counting_registry(counter.clone()));

        let trigger = Trigger::cron("* * * * *", chrono_tz::UTC).unwrap();
        let mut job = scheduler
            .schedule(Job::new("minutely", trigger, "count", json!({})))
            .await
            .unwrap();

        // Force it due
        job.next_fire = Some(Utc::now() - chrono::Duration::seconds(1));
        store.upsert(&job).await.unwrap();

        let now = Utc::now();
        for handle in scheduler.tick(now).await.unwrap() {
            handle.await.unwrap();
        }

        let stored = scheduler.get(&job.id).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(stored.last_fired, Some(now));
        assert!(stored.next_fire.unwrap() > now);
    }

    #[tokio::test]
    async fn test_cancel_missing_job() {
        let scheduler = Scheduler::new(Arc::new(MemoryJobStore::new()), HandlerRegistry::new());
        assert!(matches!(
            scheduler.cancel("ghost").await,
            Err(CronError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let scheduler = Arc::new(Scheduler::with_config(
            Arc::new(MemoryJobStore::new()),
            HandlerRegistry::new(),
            SchedulerConfig {
                tick_interval: Duration::from_millis(10),
                ..SchedulerConfig::default()
            },
        ));

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
