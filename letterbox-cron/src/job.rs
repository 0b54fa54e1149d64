//! Job definition and firing context.

use crate::trigger::{Trigger, TriggerKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job id
    pub id: String,

    /// Display name
    pub name: String,

    /// When the job fires
    pub trigger: Trigger,

    /// Name of the handler the job dispatches to
    pub handler: String,

    /// Handler parameters
    pub params: Value,

    /// Next fire time, `None` once a trigger is exhausted
    pub next_fire: Option<DateTime<Utc>>,

    /// Last time the job fired
    pub last_fired: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a job with a generated id.
    pub fn new(
        name: impl Into<String>,
        trigger: Trigger,
        handler: impl Into<String>,
        params: Value,
    ) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, trigger, handler, params)
    }

    /// Create a job with a caller supplied id.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        trigger: Trigger,
        handler: impl Into<String>,
        params: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            trigger,
            handler: handler.into(),
            params,
            next_fire: None,
            last_fired: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> TriggerKind {
        self.trigger.kind()
    }

    /// Whether the job should fire at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_fire.is_some_and(|next| next <= now)
    }
}

/// Context handed to a handler for one firing.
#[derive(Debug, Clone)]
pub struct FiringContext {
    pub job_id: String,
    pub job_name: String,
    pub kind: TriggerKind,

    /// Fire time the job was due at
    pub scheduled_for: DateTime<Utc>,

    /// Time the scheduler dispatched it
    pub fired_at: DateTime<Utc>,

    /// Job parameters as stored
    pub params: Value,
}

impl FiringContext {
    pub fn new(job: &Job, fired_at: DateTime<Utc>) -> Self {
        Self {
            job_id: job.id.clone(),
            job_name: job.name.clone(),
            kind: job.kind(),
            scheduled_for: job.next_fire.unwrap_or(fired_at),
            fired_at,
            params: job.params.clone(),
        }
    }

    /// Get the delay between scheduled and actual firing.
    pub fn delay(&self) -> chrono::Duration {
        self.fired_at - self.scheduled_for
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_new_job_has_unique_id() {
        let trigger = Trigger::once(Utc::now(), chrono_tz::UTC);
        let a = Job::new("a", trigger.clone(), "send_one_email", json!({}));
        let b = Job::new("b", trigger, "send_one_email", json!({}));
        assert_ne!(a.id, b.id);
        assert!(a.next_fire.is_none());
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();
        let mut job = Job::with_id("j1", "j1", Trigger::once(now, chrono_tz::UTC), "h", json!(null));
        assert!(!job.is_due(now));

        job.next_fire = Some(now);
        assert!(job.is_due(now));
        assert!(!job.is_due(now - Duration::seconds(1)));
    }

    #[test]
    fn test_firing_context_delay() {
        let now = Utc::now();
        let mut job = Job::with_id("j1", "j1", Trigger::once(now, chrono_tz::UTC), "h", json!({"a": 1}));
        job.next_fire = Some(now - Duration::seconds(3));

        let ctx = FiringContext::new(&job, now);
        assert_eq!(ctx.delay(), Duration::seconds(3));
        assert_eq!(ctx.params["a"], 1);
        assert_eq!(ctx.kind, TriggerKind::Once);
    }
}
