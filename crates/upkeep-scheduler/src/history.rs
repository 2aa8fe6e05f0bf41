use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;
use uuid::Uuid;

use crate::db::init_db;
use crate::error::Result;
use crate::types::{JobRun, RunStatus, RunSummary};

/// Older rows are pruned once the table grows past this.
const KEEP_RUNS: i64 = 500;

const RUN_COLUMNS: &str = "id, started_at, finished_at, status, items, events_created,
     reminders_created, failures, error";

/// Read/write access to the `job_runs` table.
///
/// Uses its own `Connection` so the HTTP health check can read the last run
/// while the engine writes.
pub struct RunHistory {
    db: Mutex<Connection>,
}

impl RunHistory {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persist the outcome of a pass. `Err` carries the reason it failed.
    pub fn record(
        &self,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcome: std::result::Result<&RunSummary, &str>,
    ) -> Result<JobRun> {
        let (status, summary, error) = match outcome {
            Ok(summary) => (RunStatus::for_summary(summary), summary.clone(), None),
            Err(reason) => (RunStatus::Failed, RunSummary::default(), Some(reason.to_string())),
        };
        let run = JobRun {
            id: Uuid::now_v7().to_string(),
            started_at,
            finished_at,
            status,
            summary,
            error,
        };

        let conn = self.conn();
        conn.execute(
            "INSERT INTO job_runs
             (id, started_at, finished_at, status, items, events_created,
              reminders_created, failures, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.id,
                run.started_at,
                run.finished_at,
                run.status.to_string(),
                run.summary.items as i64,
                run.summary.events_created as i64,
                run.summary.reminders_created as i64,
                run.summary.failures as i64,
                run.error
            ],
        )?;
        conn.execute(
            "DELETE FROM job_runs WHERE id NOT IN
             (SELECT id FROM job_runs ORDER BY started_at DESC LIMIT ?1)",
            params![KEEP_RUNS],
        )?;
        Ok(run)
    }

    /// The most recent pass, if any has been recorded.
    pub fn last_run(&self) -> Result<Option<JobRun>> {
        let conn = self.conn();
        let sql = format!("SELECT {RUN_COLUMNS} FROM job_runs ORDER BY started_at DESC LIMIT 1");
        Ok(conn.query_row(&sql, [], row_to_run).optional()?)
    }

    /// Up to `limit` passes, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<JobRun>> {
        let conn = self.conn();
        let sql = format!("SELECT {RUN_COLUMNS} FROM job_runs ORDER BY started_at DESC LIMIT ?1");
        let mut stmt = conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit as i64], row_to_run)?
            .filter_map(|r| match r {
                Ok(run) => Some(run),
                Err(e) => {
                    warn!("skipping unreadable job run row: {e}");
                    None
                }
            })
            .collect();
        Ok(runs)
    }
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<JobRun> {
    let status: String = row.get(3)?;
    let status = status.parse::<RunStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(JobRun {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        status,
        summary: RunSummary {
            items: row.get::<_, i64>(4)? as usize,
            events_created: row.get::<_, i64>(5)? as usize,
            reminders_created: row.get::<_, i64>(6)? as usize,
            failures: row.get::<_, i64>(7)? as usize,
        },
        error: row.get(8)?,
    })
}
