//! Integration tests for letterbox-cron

use chrono::{Duration, TimeZone, Utc};
use letterbox_cron::*;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn recording_registry(seen: Arc<Mutex<Vec<String>>>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    let ok_seen = seen.clone();
    registry.register("record", move |ctx| {
        let seen = ok_seen.clone();
        async move {
            seen.lock().unwrap().push(ctx.job_name);
            Ok(())
        }
    });
    registry.register("fail", |_ctx| async {
        Err(CronError::ExecutionFailed("boom".to_string()))
    });
    registry.register("panic", |ctx: FiringContext| async move {
        assert!(ctx.job_name.is_empty(), "handler blew up");
        Ok(())
    });
    registry
}

#[test]
fn test_cron_expression_parsing() {
    assert!(CronExpression::parse("0 9 * * 1").is_ok());
    assert!(CronExpression::parse("0 0 9 * * 1").is_err());
    assert!(CronExpression::parse("invalid").is_err());
}

#[test]
fn test_monday_in_taipei() {
    let tz = chrono_tz::Asia::Taipei;
    let trigger = Trigger::cron("0 9 * * 1", tz).unwrap();
    let after = tz.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap().with_timezone(&Utc);

    let next = trigger.next_fire(after).unwrap().unwrap().with_timezone(&tz);
    assert_eq!(next, tz.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap());
}

#[tokio::test]
async fn test_jobs_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.db");
    let seen = Arc::new(Mutex::new(Vec::new()));

    let id = {
        let store = Arc::new(SqliteJobStore::open(&path).unwrap());
        let scheduler = Scheduler::new(store, recording_registry(seen.clone()));
        let run_at = Utc::now() - Duration::minutes(10);
        let job = Job::new("missed", Trigger::once(run_at, chrono_tz::UTC), "record", json!({}));
        scheduler.schedule(job).await.unwrap().id
    };

    // New process: same file, fresh scheduler
    let store = Arc::new(SqliteJobStore::open(&path).unwrap());
    let scheduler = Scheduler::new(store, recording_registry(seen.clone()));
    assert_eq!(scheduler.rearm(Utc::now()).await.unwrap(), 1);

    for handle in scheduler.tick(Utc::now()).await.unwrap() {
        handle.await.unwrap();
    }

    assert_eq!(*seen.lock().unwrap(), vec!["missed".to_string()]);
    assert!(scheduler.get(&id).await.is_err());
}

#[tokio::test]
async fn test_failing_and_panicking_handlers_are_isolated() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scheduler = Scheduler::new(
        Arc::new(MemoryJobStore::new()),
        recording_registry(seen.clone()),
    );
    let past = Utc::now() - Duration::seconds(5);

    for (name, handler) in [("bad", "fail"), ("worse", "panic"), ("good", "record")] {
        let job = Job::new(name, Trigger::once(past, chrono_tz::UTC), handler, json!({}));
        scheduler.schedule(job).await.unwrap();
    }

    let handles = scheduler.tick(Utc::now()).await.unwrap();
    assert_eq!(handles.len(), 3);

    let mut panicked = 0;
    for handle in handles {
        if handle.await.is_err() {
            panicked += 1;
        }
    }

    assert_eq!(panicked, 1);
    assert_eq!(*seen.lock().unwrap(), vec!["good".to_string()]);
    assert!(scheduler.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reschedule_changes_trigger() {
    let scheduler = Scheduler::new(
        Arc::new(MemoryJobStore::new()),
        recording_registry(Arc::new(Mutex::new(Vec::new()))),
    );
    let tz = chrono_tz::Asia::Taipei;

    let job = Job::new("report", Trigger::cron("0 8 * * *", tz).unwrap(), "record", json!({"a": 1}));
    let job = scheduler.schedule(job).await.unwrap();
    let first = job.next_fire.unwrap();

    let updated = scheduler
        .reschedule(
            &job.id,
            Box::new(move |job| {
                job.trigger = Trigger::once_local("2030-01-01 10:00", tz)?;
                Ok(())
            }),
        )
        .await
        .unwrap();

    assert_ne!(updated.next_fire.unwrap(), first);
    assert_eq!(
        updated.next_fire.unwrap(),
        tz.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap().with_timezone(&Utc)
    );
    assert_eq!(updated.params, json!({"a": 1}));
    assert_eq!(updated.created_at, job.created_at);
}

#[tokio::test]
async fn test_reschedule_invalid_edit_keeps_job() {
    let scheduler = Scheduler::new(
        Arc::new(MemoryJobStore::new()),
        recording_registry(Arc::new(Mutex::new(Vec::new()))),
    );
    let job = Job::new("report", Trigger::cron("0 8 * * *", chrono_tz::UTC).unwrap(), "record", json!({}));
    let job = scheduler.schedule(job).await.unwrap();

    let result = scheduler
        .reschedule(
            &job.id,
            Box::new(|job| {
                job.trigger = Trigger::cron("0 8 * *", chrono_tz::UTC)?;
                Ok(())
            }),
        )
        .await;

    assert!(matches!(result, Err(CronError::InvalidExpression(_))));
    assert_eq!(scheduler.get(&job.id).await.unwrap(), job);
}
