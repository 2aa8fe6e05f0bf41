//! Calendar arithmetic for repeating maintenance.
//!
//! Occurrence `i` of a series is always `anchor + i * value` units, computed
//! from the anchor rather than from occurrence `i - 1`. Month and year steps
//! clamp to the last valid day of the target month, so a series anchored on
//! Jan 31 goes Feb 28, Mar 31, Apr 30 instead of drifting to the 28th.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use upkeep_core::RepetitionUnit;

/// Whether two instants fall on the same UTC calendar day.
pub fn same_day(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

/// `date` moved forward by `n` units. `None` past the end of the calendar.
pub fn add_units(date: NaiveDate, unit: RepetitionUnit, n: u32) -> Option<NaiveDate> {
    match unit {
        RepetitionUnit::Day => date.checked_add_days(Days::new(u64::from(n))),
        RepetitionUnit::Week => date.checked_add_days(Days::new(u64::from(n) * 7)),
        RepetitionUnit::Month => date.checked_add_months(Months::new(n)),
        RepetitionUnit::Year => n
            .checked_mul(12)
            .and_then(|months| date.checked_add_months(Months::new(months))),
    }
}

/// The `i`-th occurrence after `anchor` (`i = 0` is the anchor itself).
fn nth(anchor: NaiveDate, value: u32, unit: RepetitionUnit, i: u32) -> Option<NaiveDate> {
    value.checked_mul(i).and_then(|n| add_units(anchor, unit, n))
}

/// The next `count` occurrences strictly after `anchor`.
///
/// A zero `value` would repeat the anchor forever and yields nothing.
pub fn generate_next_dates(
    anchor: NaiveDate,
    value: u32,
    unit: RepetitionUnit,
    count: usize,
) -> Vec<NaiveDate> {
    series(anchor, value, unit, 1, count)
}

/// Like [`generate_next_dates`], skipping occurrences before `not_before`.
///
/// An anchor months in the past (an item nobody touched, or a job that was
/// offline) yields the next `count` dates from `not_before` on rather than a
/// run of overdue ones.
pub fn upcoming_after(
    anchor: NaiveDate,
    value: u32,
    unit: RepetitionUnit,
    count: usize,
    not_before: NaiveDate,
) -> Vec<NaiveDate> {
    if value == 0 {
        return Vec::new();
    }
    series(anchor, value, unit, first_index_from(anchor, value, unit, not_before), count)
}

fn series(
    anchor: NaiveDate,
    value: u32,
    unit: RepetitionUnit,
    first: u32,
    count: usize,
) -> Vec<NaiveDate> {
    if value == 0 {
        return Vec::new();
    }
    (first..)
        .take(count)
        .map_while(|i| nth(anchor, value, unit, i))
        .collect()
}

/// Smallest `i >= 1` whose occurrence is on or after `not_before`.
fn first_index_from(anchor: NaiveDate, value: u32, unit: RepetitionUnit, not_before: NaiveDate) -> u32 {
    let gap = (not_before - anchor).num_days();
    if gap <= 0 {
        return 1;
    }
    // Longest possible step in days, so the estimate never overshoots.
    let max_step = i64::from(value)
        * match unit {
            RepetitionUnit::Day => 1,
            RepetitionUnit::Week => 7,
            RepetitionUnit::Month => 31,
            RepetitionUnit::Year => 366,
        };
    let mut i = u32::try_from(gap / max_step).unwrap_or(u32::MAX).max(1);
    while let Some(date) = nth(anchor, value, unit, i) {
        if date >= not_before {
            break;
        }
        i = match i.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    i
}
