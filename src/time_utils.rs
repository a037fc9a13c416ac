// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! Bookkeeping timestamps are stored at minute resolution as
//! `YYYY_MM_DD_HHMM` (UTC), which doubles as a file-name suffix.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

/// `strftime` pattern for bookkeeping timestamps.
pub const STAMP_FORMAT: &str = "%Y_%m_%d_%H%M";

/// Format a UTC timestamp as `YYYY_MM_DD_HHMM`.
pub fn format_stamp(date: DateTime<Utc>) -> String {
    date.format(STAMP_FORMAT).to_string()
}

/// Parse a `YYYY_MM_DD_HHMM` timestamp as UTC.
pub fn parse_stamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, STAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Truncate to whole minutes, matching what a stamp can represent.
pub fn truncate_to_minute(date: DateTime<Utc>) -> DateTime<Utc> {
    date.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(date)
}

/// Serde adapter for `DateTime<Utc>` fields stored as stamps.
pub mod stamp {
    use super::{format_stamp, parse_stamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_stamp(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_stamp(&raw).map_err(|e| {
            serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_stamp() {
        let date = Utc.with_ymd_and_hms(2022, 7, 15, 13, 44, 59).unwrap();
        assert_eq!(format_stamp(date), "2022_07_15_1344");
    }

    #[test]
    fn test_parse_stamp() {
        let parsed = parse_stamp("2022_01_01_1200").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2022, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_stamp_rejects_iso() {
        assert!(parse_stamp("2022-01-01T12:00:00Z").is_err());
    }

    #[test]
    fn test_truncate_to_minute() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 8, 17, 42).unwrap();
        assert_eq!(
            truncate_to_minute(date),
            Utc.with_ymd_and_hms(2024, 3, 9, 8, 17, 0).unwrap()
        );
    }
}
