use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{is_constraint_violation, row_to_reminder, REMINDER_COLUMNS};
use crate::error::{MaintenanceError, Result};
use crate::store::MaintenanceStore;
use crate::types::{NewReminder, Reminder, ReminderPatch};

const ENTITY: &str = "Reminder";

impl MaintenanceStore {
    pub fn list_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE user_id = ?1 ORDER BY due_date, created_at"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], row_to_reminder)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn list_reminders_for_item(
        &self,
        user_id: &str,
        maintenance_id: &str,
    ) -> Result<Vec<Reminder>> {
        self.get_item(user_id, maintenance_id)?;
        let conn = self.conn();
        let sql = format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE user_id = ?1 AND maintenance_id = ?2 ORDER BY due_date"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, maintenance_id], row_to_reminder)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn get_reminder(&self, user_id: &str, id: &str) -> Result<Reminder> {
        let conn = self.conn();
        let sql = format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1 AND user_id = ?2");
        conn.query_row(&sql, params![id, user_id], row_to_reminder)
            .optional()?
            .ok_or_else(|| MaintenanceError::not_found(ENTITY))
    }

    #[instrument(skip(self, input))]
    pub fn create_reminder(&self, user_id: &str, input: NewReminder) -> Result<Reminder> {
        let item = self.get_item(user_id, &input.maintenance_id)?;
        let now = Utc::now().to_rfc3339();
        let reminder = Reminder {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            maintenance_id: item.id,
            due_date: input.due_date,
            is_sent: input.is_sent,
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn()
            .execute(
                "INSERT INTO reminders
                 (id, user_id, maintenance_id, due_date, is_sent, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    reminder.id,
                    reminder.user_id,
                    reminder.maintenance_id,
                    reminder.due_date,
                    reminder.is_sent,
                    reminder.created_at
                ],
            )
            .map_err(|e| duplicate_or(e, &reminder))?;
        info!(reminder_id = %reminder.id, "reminder created");
        Ok(reminder)
    }

    /// Move a reminder or flag it as sent.
    #[instrument(skip(self, patch))]
    pub fn update_reminder(&self, user_id: &str, id: &str, patch: ReminderPatch) -> Result<Reminder> {
        let mut reminder = self.get_reminder(user_id, id)?;
        if let Some(due_date) = patch.due_date {
            reminder.due_date = due_date;
        }
        if let Some(is_sent) = patch.is_sent {
            reminder.is_sent = is_sent;
        }
        reminder.updated_at = Utc::now().to_rfc3339();

        self.conn()
            .execute(
                "UPDATE reminders SET due_date = ?3, is_sent = ?4, updated_at = ?5
                 WHERE id = ?1 AND user_id = ?2",
                params![id, user_id, reminder.due_date, reminder.is_sent, reminder.updated_at],
            )
            .map_err(|e| duplicate_or(e, &reminder))?;
        info!(is_sent = reminder.is_sent, "reminder updated");
        Ok(reminder)
    }

    #[instrument(skip(self))]
    pub fn delete_reminder(&self, user_id: &str, id: &str) -> Result<Reminder> {
        let existing = self.get_reminder(user_id, id)?;
        self.conn().execute(
            "DELETE FROM reminders WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        info!("reminder deleted");
        Ok(existing)
    }
}

fn duplicate_or(err: rusqlite::Error, reminder: &Reminder) -> MaintenanceError {
    if is_constraint_violation(&err) {
        MaintenanceError::Conflict(format!(
            "A reminder on {} already exists for this maintenance.",
            reminder.due_date
        ))
    } else {
        err.into()
    }
}
