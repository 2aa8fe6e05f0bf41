use thiserror::Error;

/// All user-layer errors. The gateway maps each variant to an HTTP status.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User already exists.")]
    AlreadyExists,

    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("Wrong email or password.")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, UserError>;
