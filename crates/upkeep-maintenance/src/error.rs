use thiserror::Error;

/// Errors from the maintenance store.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    /// The row does not exist or belongs to another user.
    #[error("{entity} not found.")]
    NotFound { entity: &'static str },

    /// Input failed validation; the message is safe to show to clients.
    #[error("{0}")]
    Validation(String),

    /// A unique constraint would be violated (same item + due date).
    #[error("{0}")]
    Conflict(String),

    #[error("Category is still used by maintenance items.")]
    CategoryInUse,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl MaintenanceError {
    pub(crate) fn not_found(entity: &'static str) -> Self {
        MaintenanceError::NotFound { entity }
    }
}

pub type Result<T> = std::result::Result<T, MaintenanceError>;
