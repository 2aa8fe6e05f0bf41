use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Underlying SQLite / rusqlite error (run history).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Reading or writing maintenance rows failed.
    #[error("Maintenance store error: {0}")]
    Store(#[from] upkeep_maintenance::MaintenanceError),

    /// The configured cadence can never fire.
    #[error("Invalid cadence: {0}")]
    InvalidCadence(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
