pub mod auth;
pub mod categories;
pub mod events;
pub mod health;
pub mod maintenance;
pub mod reminders;
