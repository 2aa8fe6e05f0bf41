use rusqlite::Connection;

use crate::error::Result;

/// Initialise the run-history schema in `conn`. Idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS job_runs (
            id                 TEXT    NOT NULL PRIMARY KEY,
            started_at         TEXT    NOT NULL,   -- ISO-8601
            finished_at        TEXT    NOT NULL,   -- ISO-8601
            status             TEXT    NOT NULL,   -- ok | partial | failed
            items              INTEGER NOT NULL DEFAULT 0,
            events_created     INTEGER NOT NULL DEFAULT 0,
            reminders_created  INTEGER NOT NULL DEFAULT 0,
            failures           INTEGER NOT NULL DEFAULT 0,
            error              TEXT
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_job_runs_started ON job_runs (started_at);
        ",
    )?;
    Ok(())
}
