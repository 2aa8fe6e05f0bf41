use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use upkeep_core::types::date_input;
use upkeep_core::RepetitionUnit;

/// A user-owned label grouping maintenance items. Non-private categories
/// are visible (read-only) to every user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub is_private: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A recurring task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceItem {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub title: String,
    /// First anchor of the recurrence; occurrences fall strictly after it.
    pub start_date: NaiveDate,
    pub repetition_unit: RepetitionUnit,
    pub repetition_value: u32,
    /// Reminders are due this many days before each occurrence.
    pub reminder_days_before: u32,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One scheduled occurrence of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
    pub id: String,
    pub user_id: String,
    pub maintenance_id: String,
    pub due_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A notification slot tied to an occurrence's due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub maintenance_id: String,
    pub due_date: NaiveDate,
    pub is_sent: bool,
    pub created_at: String,
    pub updated_at: String,
}

// ── Inputs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
}

/// Body of both create and (full-replace) update of an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    pub title: String,
    pub category_id: String,
    #[serde(deserialize_with = "date_input::required")]
    pub start_date: NaiveDate,
    pub repetition_unit: RepetitionUnit,
    pub repetition_value: u32,
    #[serde(default)]
    pub reminder_days_before: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub maintenance_id: String,
    #[serde(deserialize_with = "date_input::required")]
    pub due_date: NaiveDate,
    #[serde(default, deserialize_with = "date_input::optional")]
    pub completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of an event. Absent fields are left unchanged;
/// `"completion_date": null` reopens a completed event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    #[serde(default, deserialize_with = "date_input::nullable")]
    pub completion_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReminder {
    pub maintenance_id: String,
    #[serde(deserialize_with = "date_input::required")]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub is_sent: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderPatch {
    #[serde(default, deserialize_with = "date_input::optional")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_sent: Option<bool>,
}

// ── Job view ─────────────────────────────────────────────────────────────────

/// An existing event or reminder as the materialization job sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub due_date: NaiveDate,
    /// Event completed / reminder sent.
    pub done: bool,
}

/// An item together with everything already materialized for it.
#[derive(Debug, Clone)]
pub struct ItemSchedule {
    pub item: MaintenanceItem,
    pub events: Vec<Occurrence>,
    pub reminders: Vec<Occurrence>,
}
