use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{row_to_category, CATEGORY_COLUMNS};
use crate::error::{MaintenanceError, Result};
use crate::store::MaintenanceStore;
use crate::types::{Category, CategoryInput};

const ENTITY: &str = "Category";

impl MaintenanceStore {
    /// The caller's categories followed by other users' public ones.
    pub fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE user_id = ?1 OR is_private = 0
             ORDER BY user_id != ?1, name COLLATE NOCASE"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], row_to_category)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// A category the caller may see: their own or a public one.
    pub fn get_category(&self, user_id: &str, id: &str) -> Result<Category> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE id = ?1 AND (user_id = ?2 OR is_private = 0)"
        );
        conn.query_row(&sql, params![id, user_id], row_to_category)
            .optional()?
            .ok_or_else(|| MaintenanceError::not_found(ENTITY))
    }

    #[instrument(skip(self, input))]
    pub fn create_category(&self, user_id: &str, input: CategoryInput) -> Result<Category> {
        let name = validate_name(&input.name)?;
        let now = Utc::now().to_rfc3339();
        let category = Category {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            name,
            is_private: input.is_private,
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn().execute(
            "INSERT INTO categories (id, user_id, name, is_private, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                category.id,
                category.user_id,
                category.name,
                category.is_private,
                category.created_at
            ],
        )?;
        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    /// Rename / change visibility. Only the owner may update, and a category
    /// other users' items rely on cannot be made private.
    #[instrument(skip(self, input))]
    pub fn update_category(&self, user_id: &str, id: &str, input: CategoryInput) -> Result<Category> {
        let name = validate_name(&input.name)?;
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        if input.is_private {
            let foreign: i64 = conn.query_row(
                "SELECT COUNT(*) FROM maintenance WHERE category_id = ?1 AND user_id != ?2",
                params![id, user_id],
                |row| row.get(0),
            )?;
            if foreign > 0 {
                return Err(MaintenanceError::Conflict(
                    "Category is used by other users' maintenance items.".to_string(),
                ));
            }
        }
        let n = conn.execute(
            "UPDATE categories SET name = ?3, is_private = ?4, updated_at = ?5
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id, name, input.is_private, now],
        )?;
        drop(conn);
        if n == 0 {
            return Err(MaintenanceError::not_found(ENTITY));
        }
        info!("category updated");
        self.get_category(user_id, id)
    }

    /// Delete an owned category. Refused while any item still uses it.
    #[instrument(skip(self))]
    pub fn delete_category(&self, user_id: &str, id: &str) -> Result<Category> {
        let existing = self.get_category(user_id, id)?;
        if existing.user_id != user_id {
            return Err(MaintenanceError::not_found(ENTITY));
        }

        let conn = self.conn();
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM maintenance WHERE category_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(MaintenanceError::CategoryInUse);
        }
        conn.execute(
            "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        info!("category deleted");
        Ok(existing)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MaintenanceError::Validation(
            "Please include all information.".to_string(),
        ));
    }
    Ok(name.to_string())
}
