//! `upkeep-users`: accounts, password hashing and bearer tokens.
//!
//! Passwords are stored as argon2id PHC strings. Login issues an HS256 JWT
//! whose claims carry the user's id, email and name; the gateway verifies
//! it on every authenticated request without touching the database.

pub mod db;
pub mod error;
pub mod password;
pub mod store;
pub mod token;
pub mod types;

pub use error::{Result, UserError};
pub use store::UserStore;
pub use token::{Claims, TokenSigner};
pub use types::{PublicUser, User};
