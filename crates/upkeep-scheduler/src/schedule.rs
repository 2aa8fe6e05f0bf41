use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use upkeep_core::Cadence;

/// Compute the next UTC pass time for `cadence` strictly *after* `from`.
///
/// Returns `None` only for cadences that can never fire (empty minute list,
/// out-of-range times); config validation rejects those up front.
pub fn compute_next_run(cadence: &Cadence, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match cadence {
        Cadence::Interval { every_secs } => {
            let secs = i64::try_from(*every_secs).ok().filter(|s| *s > 0)?;
            Some(from + Duration::seconds(secs))
        }

        Cadence::Hourly { minutes } => {
            let hour_start = Utc
                .with_ymd_and_hms(from.year(), from.month(), from.day(), from.hour(), 0, 0)
                .single()?;
            let mut minutes: Vec<i64> = minutes
                .iter()
                .filter(|m| **m < 60)
                .map(|m| i64::from(*m))
                .collect();
            minutes.sort_unstable();

            minutes
                .iter()
                .map(|m| hour_start + Duration::minutes(*m))
                .find(|candidate| *candidate > from)
                .or_else(|| {
                    let first = minutes.first()?;
                    Some(hour_start + Duration::hours(1) + Duration::minutes(*first))
                })
        }

        Cadence::Daily { hour, minute } => {
            let candidate = Utc
                .with_ymd_and_hms(
                    from.year(),
                    from.month(),
                    from.day(),
                    u32::from(*hour),
                    u32::from(*minute),
                    0,
                )
                .single()?;
            if candidate > from {
                Some(candidate)
            } else {
                Some(candidate + Duration::days(1))
            }
        }
    }
}
