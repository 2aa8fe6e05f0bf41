use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unit of a maintenance item's repetition ("every 2 weeks" = Week × 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepetitionUnit {
    Day,
    Week,
    Month,
    Year,
}

impl RepetitionUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepetitionUnit::Day => "day",
            RepetitionUnit::Week => "week",
            RepetitionUnit::Month => "month",
            RepetitionUnit::Year => "year",
        }
    }
}

impl fmt::Display for RepetitionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RepetitionUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "day" => Ok(RepetitionUnit::Day),
            "week" => Ok(RepetitionUnit::Week),
            "month" => Ok(RepetitionUnit::Month),
            "year" => Ok(RepetitionUnit::Year),
            other => Err(format!("unknown repetition unit: {other}")),
        }
    }
}

/// When the materialization job runs. All times are UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    /// Fixed interval in seconds.
    Interval { every_secs: u64 },
    /// Every hour at each of the listed minutes.
    Hourly { minutes: Vec<u8> },
    /// Once a day at HH:MM.
    Daily { hour: u8, minute: u8 },
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::Hourly {
            minutes: vec![0, 5],
        }
    }
}

impl Cadence {
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Cadence::Interval { every_secs } if *every_secs == 0 => {
                Err("cadence interval must be at least one second".to_string())
            }
            Cadence::Hourly { minutes } if minutes.is_empty() => {
                Err("hourly cadence needs at least one minute".to_string())
            }
            Cadence::Hourly { minutes } if minutes.iter().any(|m| *m > 59) => {
                Err("hourly cadence minutes must be 0..=59".to_string())
            }
            Cadence::Daily { hour, minute } if *hour > 23 || *minute > 59 => {
                Err(format!("invalid daily cadence time {hour:02}:{minute:02}"))
            }
            _ => Ok(()),
        }
    }
}

/// Parse a client-supplied date.
///
/// Accepts a plain `YYYY-MM-DD` or an RFC 3339 timestamp; timestamps are
/// converted to UTC and truncated to the calendar day.
pub fn parse_date_input(raw: &str) -> std::result::Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| format!("invalid date: {raw}"))
}

/// Serde helpers for request bodies that carry dates.
pub mod date_input {
    use super::*;

    pub fn required<'de, D>(d: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        parse_date_input(&raw).map_err(serde::de::Error::custom)
    }

    pub fn optional<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(d)? {
            Some(raw) => parse_date_input(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }

    /// Distinguishes "field absent" (`None`, pair with `#[serde(default)]`)
    /// from an explicit `null` (`Some(None)`).
    pub fn nullable<'de, D>(d: D) -> Result<Option<Option<NaiveDate>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        optional(d).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_roundtrip_through_str() {
        for unit in [
            RepetitionUnit::Day,
            RepetitionUnit::Week,
            RepetitionUnit::Month,
            RepetitionUnit::Year,
        ] {
            assert_eq!(unit.as_str().parse::<RepetitionUnit>().unwrap(), unit);
        }
        assert!("fortnight".parse::<RepetitionUnit>().is_err());
    }

    #[test]
    fn unit_serializes_lowercase() {
        let json = serde_json::to_string(&RepetitionUnit::Month).unwrap();
        assert_eq!(json, r#""month""#);
    }

    #[test]
    fn plain_date_is_accepted() {
        let d = parse_date_input("2026-03-01").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn timestamp_is_truncated_in_utc() {
        // 23:30 at -02:00 is already the next day in UTC.
        let d = parse_date_input("2026-03-01T23:30:00-02:00").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        let d = parse_date_input("2026-03-01T00:00:00.000Z").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn garbage_date_is_rejected() {
        assert!(parse_date_input("next tuesday").is_err());
        assert!(parse_date_input("2026-02-30").is_err());
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "date_input::nullable")]
        done: Option<Option<NaiveDate>>,
    }

    #[test]
    fn nullable_distinguishes_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.done, None);
        let null: Patch = serde_json::from_str(r#"{"done":null}"#).unwrap();
        assert_eq!(null.done, Some(None));
        let set: Patch = serde_json::from_str(r#"{"done":"2026-01-02"}"#).unwrap();
        assert_eq!(set.done, Some(NaiveDate::from_ymd_opt(2026, 1, 2)));
    }

    #[test]
    fn cadence_tagged_json() {
        let c: Cadence = serde_json::from_str(r#"{"kind":"interval","every_secs":60}"#).unwrap();
        assert_eq!(c, Cadence::Interval { every_secs: 60 });
        assert!(Cadence::Interval { every_secs: 0 }.validate().is_err());
        assert!(Cadence::Daily { hour: 24, minute: 0 }.validate().is_err());
        assert!(Cadence::default().validate().is_ok());
    }
}
