//! `upkeep-maintenance`: categories, maintenance items and their
//! materialized events and reminders, persisted in SQLite.
//!
//! Every user-facing method takes the caller's user id and filters on it;
//! a row owned by someone else is reported as not found. The job-facing
//! methods in [`store`] (`schedules`, `insert_events`, `insert_reminders`)
//! are not user scoped.

mod categories;
pub mod db;
pub mod error;
mod events;
mod items;
mod reminders;
pub mod store;
pub mod types;

pub use error::{MaintenanceError, Result};
pub use store::MaintenanceStore;
pub use types::{
    Category, CategoryInput, EventPatch, ItemInput, ItemSchedule, MaintenanceEvent,
    MaintenanceItem, NewEvent, NewReminder, Occurrence, Reminder, ReminderPatch,
};
