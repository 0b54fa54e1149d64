//! SQLite-backed job store.

use crate::error::{CronError, CronResult};
use crate::job::Job;
use crate::store::{JobEdit, JobStore};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

const SELECT_COLUMNS: &str = "SELECT id, name, schedule, handler, params, next_fire, last_fired,
        created_at, updated_at FROM jobs";

/// Initialise the job schema in `conn`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings so that text comparison
/// orders them chronologically.
pub fn init_db(conn: &Connection) -> CronResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL,
            schedule    TEXT NOT NULL,   -- JSON-encoded Trigger
            handler     TEXT NOT NULL,
            params      TEXT NOT NULL,   -- JSON handler parameters
            next_fire   TEXT,            -- NULL once exhausted
            last_fired  TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_jobs_next_fire ON jobs (next_fire);
        ",
    )?;
    Ok(())
}

fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_time(text: &str) -> CronResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

/// Raw column values of one `jobs` row.
struct JobRow {
    id: String,
    name: String,
    schedule: String,
    handler: String,
    params: String,
    next_fire: Option<String>,
    last_fired: Option<String>,
    created_at: String,
    updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            schedule: row.get(2)?,
            handler: row.get(3)?,
            params: row.get(4)?,
            next_fire: row.get(5)?,
            last_fired: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_job(self) -> CronResult<Job> {
        Ok(Job {
            trigger: serde_json::from_str(&self.schedule)?,
            params: serde_json::from_str(&self.params)?,
            next_fire: self.next_fire.as_deref().map(decode_time).transpose()?,
            last_fired: self.last_fired.as_deref().map(decode_time).transpose()?,
            created_at: decode_time(&self.created_at)?,
            updated_at: decode_time(&self.updated_at)?,
            id: self.id,
            name: self.name,
            handler: self.handler,
        })
    }
}

/// Decode rows, skipping any that no longer parse.
fn collect_jobs(rows: Vec<JobRow>) -> Vec<Job> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match row.into_job() {
                Ok(job) => Some(job),
                Err(e) => {
                    warn!(job_id = %id, error = %e, "skipping unreadable job row");
                    None
                }
            }
        })
        .collect()
}

fn write_job(conn: &Connection, job: &Job) -> CronResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO jobs
         (id, name, schedule, handler, params, next_fire, last_fired, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            job.id,
            job.name,
            serde_json::to_string(&job.trigger)?,
            job.handler,
            serde_json::to_string(&job.params)?,
            job.next_fire.map(encode_time),
            job.last_fired.map(encode_time),
            encode_time(job.created_at),
            encode_time(job.updated_at),
        ],
    )?;
    Ok(())
}

/// Job store persisted in a single SQLite file.
///
/// Jobs written here survive restarts; the CLI and a running service can
/// share one database file.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> CronResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        info!(path = %path.display(), journal_mode = %mode, "job store opened");
        Self::from_connection(conn)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> CronResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> CronResult<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn upsert(&self, job: &Job) -> CronResult<()> {
        let conn = self.conn.lock().await;
        write_job(&conn, job)
    }

    async fn get(&self, id: &str) -> CronResult<Option<Job>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                [id],
                JobRow::from_row,
            )
            .optional()?;
        row.map(JobRow::into_job).transpose()
    }

    async fn list(&self) -> CronResult<Vec<Job>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY next_fire IS NULL, next_fire, created_at",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], JobRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(collect_jobs(rows))
    }

    async fn remove(&self, id: &str) -> CronResult<bool> {
        let conn = self.conn.lock().await;
        let n = conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    async fn modify(&self, id: &str, edit: JobEdit) -> CronResult<Job> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let row = tx
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                [id],
                JobRow::from_row,
            )
            .optional()?
            .ok_or_else(|| CronError::JobNotFound(id.to_string()))?;

        let mut job = row.into_job()?;
        edit(&mut job)?;
        write_job(&tx, &job)?;
        tx.commit()?;
        Ok(job)
    }

    async fn due(&self, now: DateTime<Utc>) -> CronResult<Vec<Job>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE next_fire IS NOT NULL AND next_fire <= ?1 ORDER BY next_fire, created_at",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([encode_time(now)], JobRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(collect_jobs(rows))
    }
}
