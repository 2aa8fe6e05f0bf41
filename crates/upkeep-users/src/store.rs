use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::{init_db, row_to_user, USER_SELECT_SQL};
use crate::error::{Result, UserError};
use crate::password::{hash_password, verify_password};
use crate::types::User;

/// Account storage. Wraps one SQLite connection in a `Mutex`.
pub struct UserStore {
    db: Mutex<Connection>,
}

impl UserStore {
    /// Wrap `conn`, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave SQLite half-written,
        // so a poisoned guard is still usable.
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create an account. All fields are required; the email must be new.
    #[instrument(skip(self, password), fields(email = %email))]
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(UserError::Validation(
                "Please include all information".to_string(),
            ));
        }

        if self.find_by_email(&email)?.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let now = Utc::now().to_rfc3339();
        let user = User {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            email,
            password_hash: hash_password(password)?,
            created_at: now.clone(),
            updated_at: now,
        };

        let inserted = self.conn().execute(
            "INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![user.id, user.name, user.email, user.password_hash, user.created_at],
        );
        match inserted {
            Ok(_) => {}
            // Lost a race with a concurrent registration for the same email.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(UserError::AlreadyExists)
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials. Unknown email and wrong password are the same error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(UserError::Validation(
                "Please include all information".to_string(),
            ));
        }
        let Some(user) = self.find_by_email(&email)? else {
            warn!("login for unknown email");
            return Err(UserError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(UserError::InvalidCredentials);
        }
        Ok(user)
    }

    pub fn get(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let sql = format!("{USER_SELECT_SQL} WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], row_to_user).optional()?)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let sql = format!("{USER_SELECT_SQL} WHERE email = ?1");
        Ok(conn.query_row(&sql, params![email], row_to_user).optional()?)
    }

    /// Replace the password after re-checking the current one.
    #[instrument(skip(self, current, new), fields(user_id = %id))]
    pub fn change_password(&self, id: &str, current: &str, new: &str) -> Result<()> {
        if current.is_empty() || new.trim().is_empty() {
            return Err(UserError::Validation(
                "Please include all information".to_string(),
            ));
        }
        let user = self
            .get(id)?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        if !verify_password(current, &user.password_hash) {
            warn!("password change with wrong current password");
            return Err(UserError::InvalidCredentials);
        }

        let hash = hash_password(new)?;
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, hash, now],
        )?;
        info!("password changed");
        Ok(())
    }

    /// Remove the account row. Owned maintenance data is purged separately.
    #[instrument(skip(self), fields(user_id = %id))]
    pub fn delete(&self, id: &str) -> Result<()> {
        let n = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }
        info!("user deleted");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
