use serde::{Deserialize, Serialize};

/// Full user record as stored in SQLite. Never serialised to clients;
/// use [`PublicUser`] for responses.
#[derive(Debug, Clone)]
pub struct User {
    /// UUIDv7, time-sortable.
    pub id: String,
    pub name: String,
    /// Stored trimmed and lower-cased; unique.
    pub email: String,
    /// argon2 PHC string.
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

/// The subset of a user that is safe to return over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}
