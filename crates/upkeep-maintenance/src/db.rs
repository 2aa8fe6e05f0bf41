use rusqlite::{types::Type, Connection, Result};
use upkeep_core::RepetitionUnit;

use crate::types::{Category, MaintenanceEvent, MaintenanceItem, Reminder};

/// Initialise all maintenance tables. Safe to call on every startup.
///
/// Events and reminders are unique per (maintenance_id, due_date); the
/// materialization job relies on that for `INSERT OR IGNORE` dedup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS categories (
            id          TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL,
            name        TEXT NOT NULL,
            is_private  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_categories_user ON categories (user_id);

        CREATE TABLE IF NOT EXISTS maintenance (
            id                   TEXT PRIMARY KEY NOT NULL,
            user_id              TEXT NOT NULL,
            category_id          TEXT NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
            title                TEXT NOT NULL,
            start_date           TEXT NOT NULL,   -- YYYY-MM-DD
            repetition_unit      TEXT NOT NULL,   -- day | week | month | year
            repetition_value     INTEGER NOT NULL,
            reminder_days_before INTEGER NOT NULL DEFAULT 0,
            notes                TEXT,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_maintenance_user ON maintenance (user_id, category_id);

        CREATE TABLE IF NOT EXISTS maintenance_events (
            id               TEXT PRIMARY KEY NOT NULL,
            user_id          TEXT NOT NULL,
            maintenance_id   TEXT NOT NULL REFERENCES maintenance(id) ON DELETE CASCADE,
            due_date         TEXT NOT NULL,
            completion_date  TEXT,
            notes            TEXT,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL,
            UNIQUE (maintenance_id, due_date)
        );
        CREATE INDEX IF NOT EXISTS idx_events_user ON maintenance_events (user_id, due_date);

        CREATE TABLE IF NOT EXISTS reminders (
            id              TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            maintenance_id  TEXT NOT NULL REFERENCES maintenance(id) ON DELETE CASCADE,
            due_date        TEXT NOT NULL,
            is_sent         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            UNIQUE (maintenance_id, due_date)
        );
        CREATE INDEX IF NOT EXISTS idx_reminders_user ON reminders (user_id, due_date);
        ",
    )
}

pub(crate) const CATEGORY_COLUMNS: &str = "id, user_id, name, is_private, created_at, updated_at";

pub(crate) fn row_to_category(row: &rusqlite::Row<'_>) -> Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        is_private: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) const ITEM_COLUMNS: &str = "id, user_id, category_id, title, start_date, \
     repetition_unit, repetition_value, reminder_days_before, notes, created_at, updated_at";

pub(crate) fn row_to_item(row: &rusqlite::Row<'_>) -> Result<MaintenanceItem> {
    let unit_str: String = row.get(5)?;
    let repetition_unit: RepetitionUnit = unit_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
    })?;
    Ok(MaintenanceItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        title: row.get(3)?,
        start_date: row.get(4)?,
        repetition_unit,
        repetition_value: row.get(6)?,
        reminder_days_before: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(crate) const EVENT_COLUMNS: &str =
    "id, user_id, maintenance_id, due_date, completion_date, notes, created_at, updated_at";

pub(crate) fn row_to_event(row: &rusqlite::Row<'_>) -> Result<MaintenanceEvent> {
    Ok(MaintenanceEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        maintenance_id: row.get(2)?,
        due_date: row.get(3)?,
        completion_date: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub(crate) const REMINDER_COLUMNS: &str =
    "id, user_id, maintenance_id, due_date, is_sent, created_at, updated_at";

pub(crate) fn row_to_reminder(row: &rusqlite::Row<'_>) -> Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        maintenance_id: row.get(2)?,
        due_date: row.get(3)?,
        is_sent: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// True when `err` is a UNIQUE / foreign-key violation.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
