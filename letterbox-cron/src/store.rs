//! Job persistence.

use crate::error::{CronError, CronResult};
use crate::job::Job;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-place edit applied by [`JobStore::modify`].
pub type JobEdit = Box<dyn FnOnce(&mut Job) -> CronResult<()> + Send>;

/// Durable job storage.
///
/// Every method is atomic: readers observe a job either before or after a
/// write, never half of one.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a job, replacing any job with the same id.
    async fn upsert(&self, job: &Job) -> CronResult<()>;

    async fn get(&self, id: &str) -> CronResult<Option<Job>>;

    /// All jobs ordered by next fire time, exhausted jobs last.
    async fn list(&self) -> CronResult<Vec<Job>>;

    /// Remove a job. Returns `false` if it did not exist.
    async fn remove(&self, id: &str) -> CronResult<bool>;

    /// Read, edit and write back a single job.
    ///
    /// Nothing is written if `edit` fails. Fails with `JobNotFound` if the
    /// job does not exist.
    async fn modify(&self, id: &str, edit: JobEdit) -> CronResult<Job>;

    /// Jobs whose next fire time is at or before `now`, earliest first.
    async fn due(&self, now: DateTime<Utc>) -> CronResult<Vec<Job>>;
}

pub(crate) fn sort_by_next_fire(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| match (a.next_fire, b.next_fire) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.created_at.cmp(&b.created_at)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });
}

/// Process-local store, used in tests and dry runs.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn upsert(&self, job: &Job) -> CronResult<()> {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> CronResult<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn list(&self) -> CronResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        sort_by_next_fire(&mut jobs);
        Ok(jobs)
    }

    async fn remove(&self, id: &str) -> CronResult<bool> {
        Ok(self.jobs.write().await.remove(id).is_some())
    }

    async fn modify(&self, id: &str, edit: JobEdit) -> CronResult<Job> {
        let mut jobs = self.jobs.write().await;
        let current = jobs
            .get(id)
            .ok_or_else(|| CronError::JobNotFound(id.to_string()))?;

        let mut updated = current.clone();
        edit(&mut updated)?;
        jobs.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn due(&self, now: DateTime<Utc>) -> CronResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.is_due(now))
            .cloned()
            .collect();
        sort_by_next_fire(&mut jobs);
        Ok(jobs)
    }
}
