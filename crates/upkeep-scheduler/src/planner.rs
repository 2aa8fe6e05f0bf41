//! Decide which due dates the job should materialize for one item.
//!
//! Pure functions over an [`ItemSchedule`]; persistence happens elsewhere.

use chrono::{Days, NaiveDate};
use upkeep_maintenance::{ItemSchedule, Occurrence};

use crate::recurrence::upcoming_after;

/// Dates to insert for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub events: Vec<NaiveDate>,
    pub reminders: Vec<NaiveDate>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.reminders.is_empty()
    }
}

/// Top the item up to `upcoming` open events and unsent reminders.
///
/// Open means not done and due today or later. New dates always come from the
/// series anchored on the item's start date and land after the latest existing
/// due date (done or not), so month-end items stay on the month end.
pub fn plan_item(schedule: &ItemSchedule, today: NaiveDate, upcoming: usize) -> Plan {
    let item = &schedule.item;
    let events = plan_series(
        &schedule.events,
        today,
        upcoming,
        0,
        item.start_date,
        item.repetition_value,
        item.repetition_unit,
    );
    let reminders = plan_series(
        &schedule.reminders,
        today,
        upcoming,
        item.reminder_days_before,
        item.start_date,
        item.repetition_value,
        item.repetition_unit,
    );
    Plan { events, reminders }
}

/// Plan one series whose rows sit `offset` days before the occurrence.
///
/// Existing rows are shifted forward by `offset` into occurrence space, where
/// they only raise the lower bound for new dates. The result is shifted back.
fn plan_series(
    existing: &[Occurrence],
    today: NaiveDate,
    upcoming: usize,
    offset: u32,
    start_date: NaiveDate,
    value: u32,
    unit: upkeep_core::RepetitionUnit,
) -> Vec<NaiveDate> {
    let open = existing
        .iter()
        .filter(|o| !o.done && o.due_date >= today)
        .count();
    let missing = upcoming.saturating_sub(open);
    if missing == 0 {
        return Vec::new();
    }

    let offset = Days::new(u64::from(offset));
    // A reminder is due `offset` days before its occurrence, so an
    // occurrence qualifies when its reminder date is today or later.
    let Some(mut not_before) = today.checked_add_days(offset) else {
        return Vec::new();
    };
    if let Some(latest) = existing.iter().map(|o| o.due_date).max() {
        match latest
            .checked_add_days(offset)
            .and_then(|d| d.checked_add_days(Days::new(1)))
        {
            Some(after_latest) => not_before = not_before.max(after_latest),
            None => return Vec::new(),
        }
    }

    upcoming_after(start_date, value, unit, missing, not_before)
        .into_iter()
        .filter_map(|date| date.checked_sub_days(offset))
        .collect()
}
