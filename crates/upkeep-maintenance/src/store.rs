use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::{init_db, row_to_item, ITEM_COLUMNS};
use crate::error::Result;
use crate::types::{ItemSchedule, MaintenanceItem, Occurrence};

/// Persistence for everything a user tracks. Wraps one SQLite connection.
///
/// The gateway and the scheduler engine each get their own store (and so
/// their own connection) over the same database file.
pub struct MaintenanceStore {
    db: Mutex<Connection>,
}

impl MaintenanceStore {
    /// Wrap `conn`, enabling foreign keys and creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    // --- materialization job ------------------------------------------------

    /// Every item with the due dates already materialized for it.
    pub fn schedules(&self) -> Result<Vec<ItemSchedule>> {
        let conn = self.conn();

        let items: Vec<MaintenanceItem> = {
            let sql = format!("SELECT {ITEM_COLUMNS} FROM maintenance ORDER BY created_at");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], row_to_item)?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut events = occurrences_by_item(
            &conn,
            "SELECT maintenance_id, due_date, completion_date IS NOT NULL
             FROM maintenance_events",
        )?;
        let mut reminders = occurrences_by_item(
            &conn,
            "SELECT maintenance_id, due_date, is_sent FROM reminders",
        )?;

        Ok(items
            .into_iter()
            .map(|item| ItemSchedule {
                events: events.remove(&item.id).unwrap_or_default(),
                reminders: reminders.remove(&item.id).unwrap_or_default(),
                item,
            })
            .collect())
    }

    /// Insert events for `item` on each date, skipping dates that already
    /// have one. Returns how many rows were actually created.
    #[instrument(skip(self, item, dates), fields(maintenance_id = %item.id, dates = dates.len()))]
    pub fn insert_events(&self, item: &MaintenanceItem, dates: &[NaiveDate]) -> Result<usize> {
        self.insert_ignoring_duplicates(
            "INSERT OR IGNORE INTO maintenance_events
             (id, user_id, maintenance_id, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            item,
            dates,
        )
    }

    /// Same as [`insert_events`](Self::insert_events) for reminders.
    #[instrument(skip(self, item, dates), fields(maintenance_id = %item.id, dates = dates.len()))]
    pub fn insert_reminders(&self, item: &MaintenanceItem, dates: &[NaiveDate]) -> Result<usize> {
        self.insert_ignoring_duplicates(
            "INSERT OR IGNORE INTO reminders
             (id, user_id, maintenance_id, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            item,
            dates,
        )
    }

    fn insert_ignoring_duplicates(
        &self,
        sql: &str,
        item: &MaintenanceItem,
        dates: &[NaiveDate],
    ) -> Result<usize> {
        if dates.is_empty() {
            return Ok(0);
        }
        let now = Utc::now().to_rfc3339();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut created = 0;
        {
            let mut stmt = tx.prepare_cached(sql)?;
            for date in dates {
                created += stmt.execute(params![
                    Uuid::now_v7().to_string(),
                    item.user_id,
                    item.id,
                    date,
                    now
                ])?;
            }
        }
        tx.commit()?;
        debug!(created, "occurrences inserted");
        Ok(created)
    }

    // --- account lifecycle --------------------------------------------------

    /// Delete every row owned by `user_id`. Used when an account is removed.
    #[instrument(skip(self))]
    pub fn purge_user(&self, user_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        // Events and reminders go with their items (ON DELETE CASCADE).
        tx.execute("DELETE FROM maintenance WHERE user_id = ?1", [user_id])?;
        // Public categories of this user may still be referenced by other
        // users' items; those stay, everything else goes.
        tx.execute(
            "DELETE FROM categories WHERE user_id = ?1
             AND id NOT IN (SELECT category_id FROM maintenance)",
            [user_id],
        )?;
        tx.commit()?;
        info!("user data purged");
        Ok(())
    }
}

/// Load `(maintenance_id, due_date, done)` rows grouped by item.
fn occurrences_by_item(
    conn: &Connection,
    sql: &str,
) -> Result<HashMap<String, Vec<Occurrence>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            Occurrence {
                due_date: row.get(1)?,
                done: row.get(2)?,
            },
        ))
    })?;

    let mut grouped: HashMap<String, Vec<Occurrence>> = HashMap::new();
    for row in rows {
        let (maintenance_id, occurrence) = row?;
        grouped.entry(maintenance_id).or_default().push(occurrence);
    }
    Ok(grouped)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{CategoryInput, ItemInput};
    use upkeep_core::RepetitionUnit;

    pub(crate) fn store() -> MaintenanceStore {
        MaintenanceStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A category plus one monthly item owned by `user`.
    pub(crate) fn seed_item(store: &MaintenanceStore, user: &str) -> MaintenanceItem {
        let category = store
            .create_category(
                user,
                CategoryInput {
                    name: "House".to_string(),
                    is_private: true,
                },
            )
            .unwrap();
        store
            .create_item(user, item_input(&category.id))
            .unwrap()
    }

    pub(crate) fn item_input(category_id: &str) -> ItemInput {
        ItemInput {
            title: "Replace air filter".to_string(),
            category_id: category_id.to_string(),
            start_date: date(2026, 1, 15),
            repetition_unit: RepetitionUnit::Month,
            repetition_value: 1,
            reminder_days_before: 0,
            notes: None,
        }
    }

    #[test]
    fn insert_events_skips_existing_dates() {
        let s = store();
        let item = seed_item(&s, "u1");
        let first = s
            .insert_events(&item, &[date(2026, 2, 15), date(2026, 3, 15)])
            .unwrap();
        assert_eq!(first, 2);

        let second = s
            .insert_events(&item, &[date(2026, 3, 15), date(2026, 4, 15)])
            .unwrap();
        assert_eq!(second, 1);
        assert_eq!(s.list_events_for_item("u1", &item.id).unwrap().len(), 3);
    }

    #[test]
    fn schedules_group_occurrences_by_item() {
        let s = store();
        let a = seed_item(&s, "u1");
        let b = seed_item(&s, "u2");
        s.insert_events(&a, &[date(2026, 2, 15)]).unwrap();
        s.insert_reminders(&a, &[date(2026, 2, 15), date(2026, 3, 15)])
            .unwrap();

        let schedules = s.schedules().unwrap();
        assert_eq!(schedules.len(), 2);
        let sa = schedules.iter().find(|s| s.item.id == a.id).unwrap();
        let sb = schedules.iter().find(|s| s.item.id == b.id).unwrap();
        assert_eq!(sa.events.len(), 1);
        assert_eq!(sa.reminders.len(), 2);
        assert!(!sa.events[0].done);
        assert!(sb.events.is_empty() && sb.reminders.is_empty());
    }

    #[test]
    fn schedules_report_completion() {
        let s = store();
        let item = seed_item(&s, "u1");
        s.insert_events(&item, &[date(2026, 2, 15)]).unwrap();
        let event = &s.list_events_for_item("u1", &item.id).unwrap()[0];
        s.update_event(
            "u1",
            &event.id,
            crate::types::EventPatch {
                completion_date: Some(Some(date(2026, 2, 16))),
                notes: None,
            },
        )
        .unwrap();

        let schedules = s.schedules().unwrap();
        assert!(schedules[0].events[0].done);
    }

    #[test]
    fn purge_user_removes_only_that_user() {
        let s = store();
        let mine = seed_item(&s, "u1");
        let theirs = seed_item(&s, "u2");
        s.insert_events(&mine, &[date(2026, 2, 15)]).unwrap();
        s.insert_events(&theirs, &[date(2026, 2, 15)]).unwrap();

        s.purge_user("u1").unwrap();
        assert!(s.list_items("u1").unwrap().is_empty());
        assert!(s.list_categories("u1").unwrap().is_empty());
        assert!(s.list_events("u1").unwrap().is_empty());
        assert_eq!(s.list_items("u2").unwrap().len(), 1);
        assert_eq!(s.list_events("u2").unwrap().len(), 1);
    }
}
