use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{row_to_item, ITEM_COLUMNS};
use crate::error::{MaintenanceError, Result};
use crate::store::MaintenanceStore;
use crate::types::{ItemInput, MaintenanceItem};

const ENTITY: &str = "Maintenance";

impl MaintenanceStore {
    pub fn list_items(&self, user_id: &str) -> Result<Vec<MaintenanceItem>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM maintenance WHERE user_id = ?1 ORDER BY created_at"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], row_to_item)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn list_items_by_category(
        &self,
        user_id: &str,
        category_id: &str,
    ) -> Result<Vec<MaintenanceItem>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM maintenance
             WHERE user_id = ?1 AND category_id = ?2 ORDER BY created_at"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, category_id], row_to_item)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn get_item(&self, user_id: &str, id: &str) -> Result<MaintenanceItem> {
        let conn = self.conn();
        let sql = format!("SELECT {ITEM_COLUMNS} FROM maintenance WHERE id = ?1 AND user_id = ?2");
        conn.query_row(&sql, params![id, user_id], row_to_item)
            .optional()?
            .ok_or_else(|| MaintenanceError::not_found(ENTITY))
    }

    #[instrument(skip(self, input))]
    pub fn create_item(&self, user_id: &str, input: ItemInput) -> Result<MaintenanceItem> {
        let input = self.validate_item(user_id, input)?;
        let now = Utc::now().to_rfc3339();
        let item = MaintenanceItem {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            category_id: input.category_id,
            title: input.title,
            start_date: input.start_date,
            repetition_unit: input.repetition_unit,
            repetition_value: input.repetition_value,
            reminder_days_before: input.reminder_days_before,
            notes: input.notes,
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn().execute(
            "INSERT INTO maintenance
             (id, user_id, category_id, title, start_date, repetition_unit,
              repetition_value, reminder_days_before, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                item.id,
                item.user_id,
                item.category_id,
                item.title,
                item.start_date,
                item.repetition_unit.as_str(),
                item.repetition_value,
                item.reminder_days_before,
                item.notes,
                item.created_at
            ],
        )?;
        info!(maintenance_id = %item.id, "maintenance item created");
        Ok(item)
    }

    /// Full replace of the editable fields.
    ///
    /// Already materialized events keep their dates; the job continues the
    /// new recurrence from the latest existing due date.
    #[instrument(skip(self, input))]
    pub fn update_item(&self, user_id: &str, id: &str, input: ItemInput) -> Result<MaintenanceItem> {
        // Existence first so a foreign id reports the item, not its category.
        self.get_item(user_id, id)?;
        let input = self.validate_item(user_id, input)?;
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "UPDATE maintenance SET
                category_id = ?3, title = ?4, start_date = ?5, repetition_unit = ?6,
                repetition_value = ?7, reminder_days_before = ?8, notes = ?9, updated_at = ?10
             WHERE id = ?1 AND user_id = ?2",
            params![
                id,
                user_id,
                input.category_id,
                input.title,
                input.start_date,
                input.repetition_unit.as_str(),
                input.repetition_value,
                input.reminder_days_before,
                input.notes,
                now
            ],
        )?;
        info!("maintenance item updated");
        self.get_item(user_id, id)
    }

    /// Delete an item together with its events and reminders.
    #[instrument(skip(self))]
    pub fn delete_item(&self, user_id: &str, id: &str) -> Result<MaintenanceItem> {
        let existing = self.get_item(user_id, id)?;
        self.conn().execute(
            "DELETE FROM maintenance WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        info!("maintenance item deleted");
        Ok(existing)
    }

    fn validate_item(&self, user_id: &str, mut input: ItemInput) -> Result<ItemInput> {
        input.title = input.title.trim().to_string();
        if input.title.is_empty() || input.category_id.trim().is_empty() {
            return Err(MaintenanceError::Validation(
                "Something went wrong. Missing information".to_string(),
            ));
        }
        if input.repetition_value == 0 {
            return Err(MaintenanceError::Validation(
                "repetition_value must be at least 1".to_string(),
            ));
        }
        input.notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        // The category must be one the caller can see.
        self.get_category(user_id, &input.category_id)?;
        Ok(input)
    }
}
