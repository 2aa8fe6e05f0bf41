use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{is_constraint_violation, row_to_event, EVENT_COLUMNS};
use crate::error::{MaintenanceError, Result};
use crate::store::MaintenanceStore;
use crate::types::{EventPatch, MaintenanceEvent, NewEvent};

const ENTITY: &str = "Maintenance event";

impl MaintenanceStore {
    /// All of the caller's events, soonest first.
    pub fn list_events(&self, user_id: &str) -> Result<Vec<MaintenanceEvent>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM maintenance_events
             WHERE user_id = ?1 ORDER BY due_date, created_at"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], row_to_event)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Events of one item. The item itself must belong to the caller.
    pub fn list_events_for_item(
        &self,
        user_id: &str,
        maintenance_id: &str,
    ) -> Result<Vec<MaintenanceEvent>> {
        self.get_item(user_id, maintenance_id)?;
        let conn = self.conn();
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM maintenance_events
             WHERE user_id = ?1 AND maintenance_id = ?2 ORDER BY due_date"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, maintenance_id], row_to_event)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn get_event(&self, user_id: &str, id: &str) -> Result<MaintenanceEvent> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM maintenance_events WHERE id = ?1 AND user_id = ?2"
        );
        conn.query_row(&sql, params![id, user_id], row_to_event)
            .optional()?
            .ok_or_else(|| MaintenanceError::not_found(ENTITY))
    }

    /// Manually schedule an occurrence (e.g. an extra, off-cycle service).
    #[instrument(skip(self, input))]
    pub fn create_event(&self, user_id: &str, input: NewEvent) -> Result<MaintenanceEvent> {
        let item = self.get_item(user_id, &input.maintenance_id)?;
        let now = Utc::now().to_rfc3339();
        let event = MaintenanceEvent {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            maintenance_id: item.id,
            due_date: input.due_date,
            completion_date: input.completion_date,
            notes: clean_notes(input.notes),
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn()
            .execute(
                "INSERT INTO maintenance_events
                 (id, user_id, maintenance_id, due_date, completion_date, notes,
                  created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    event.id,
                    event.user_id,
                    event.maintenance_id,
                    event.due_date,
                    event.completion_date,
                    event.notes,
                    event.created_at
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    MaintenanceError::Conflict(format!(
                        "An event on {} already exists for this maintenance.",
                        event.due_date
                    ))
                } else {
                    e.into()
                }
            })?;
        info!(event_id = %event.id, "maintenance event created");
        Ok(event)
    }

    /// Mark complete / reopen and edit notes.
    #[instrument(skip(self, patch))]
    pub fn update_event(&self, user_id: &str, id: &str, patch: EventPatch) -> Result<MaintenanceEvent> {
        let mut event = self.get_event(user_id, id)?;
        if let Some(completion_date) = patch.completion_date {
            event.completion_date = completion_date;
        }
        if let Some(notes) = patch.notes {
            event.notes = clean_notes(Some(notes));
        }
        event.updated_at = Utc::now().to_rfc3339();

        self.conn().execute(
            "UPDATE maintenance_events
             SET completion_date = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id, event.completion_date, event.notes, event.updated_at],
        )?;
        info!(completed = event.completion_date.is_some(), "maintenance event updated");
        Ok(event)
    }

    #[instrument(skip(self))]
    pub fn delete_event(&self, user_id: &str, id: &str) -> Result<MaintenanceEvent> {
        let existing = self.get_event(user_id, id)?;
        self.conn().execute(
            "DELETE FROM maintenance_events WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        info!("maintenance event deleted");
        Ok(existing)
    }
}

/// Blank notes are stored as NULL.
fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use crate::error::MaintenanceError;
    use crate::store::tests::{date, seed_item, store};
    use crate::types::{EventPatch, NewEvent};

    fn new_event(maintenance_id: &str, day: u32) -> NewEvent {
        NewEvent {
            maintenance_id: maintenance_id.to_string(),
            due_date: date(2026, 2, day),
            completion_date: None,
            notes: None,
        }
    }

    #[test]
    fn create_and_list_in_due_order() {
        let s = store();
        let item = seed_item(&s, "u1");
        s.create_event("u1", new_event(&item.id, 20)).unwrap();
        s.create_event("u1", new_event(&item.id, 10)).unwrap();

        let dates: Vec<_> = s
            .list_events_for_item("u1", &item.id)
            .unwrap()
            .into_iter()
            .map(|e| e.due_date)
            .collect();
        assert_eq!(dates, vec![date(2026, 2, 10), date(2026, 2, 20)]);
    }

    #[test]
    fn duplicate_due_date_conflicts() {
        let s = store();
        let item = seed_item(&s, "u1");
        s.create_event("u1", new_event(&item.id, 10)).unwrap();
        assert!(matches!(
            s.create_event("u1", new_event(&item.id, 10)),
            Err(MaintenanceError::Conflict(_))
        ));
    }

    #[test]
    fn cannot_add_events_to_foreign_items() {
        let s = store();
        let item = seed_item(&s, "u1");
        assert!(matches!(
            s.create_event("u2", new_event(&item.id, 10)),
            Err(MaintenanceError::NotFound { .. })
        ));
        assert!(s.list_events_for_item("u2", &item.id).is_err());
    }

    #[test]
    fn complete_then_reopen() {
        let s = store();
        let item = seed_item(&s, "u1");
        let ev = s.create_event("u1", new_event(&item.id, 10)).unwrap();

        let done = s
            .update_event(
                "u1",
                &ev.id,
                EventPatch {
                    completion_date: Some(Some(date(2026, 2, 11))),
                    notes: Some("replaced with MERV 13".to_string()),
                },
            )
            .unwrap();
        assert_eq!(done.completion_date, Some(date(2026, 2, 11)));
        assert_eq!(done.notes.as_deref(), Some("replaced with MERV 13"));

        // Absent fields are left alone.
        let untouched = s.update_event("u1", &ev.id, EventPatch::default()).unwrap();
        assert_eq!(untouched.completion_date, Some(date(2026, 2, 11)));

        let reopened = s
            .update_event(
                "u1",
                &ev.id,
                EventPatch {
                    completion_date: Some(None),
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(reopened.completion_date, None);
        assert_eq!(s.get_event("u1", &ev.id).unwrap(), reopened);
    }

    #[test]
    fn delete_is_owner_only() {
        let s = store();
        let item = seed_item(&s, "u1");
        let ev = s.create_event("u1", new_event(&item.id, 10)).unwrap();
        assert!(s.delete_event("u2", &ev.id).is_err());
        assert_eq!(s.delete_event("u1", &ev.id).unwrap().id, ev.id);
        assert!(s.get_event("u1", &ev.id).is_err());
    }
}
