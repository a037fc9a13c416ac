// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decides whether a sync attempt may start, from stored timeout stamps.
//!
//! Strava quotas reset at UTC midnight (daily) and on quarter-hour
//! boundaries (15-minute). Once a window has been exhausted, nothing is
//! attempted until that window rolls over.

use crate::error::RateLimitKind;
use crate::models::Credentials;
use chrono::{DateTime, Datelike, Duration, DurationRound, Timelike, Utc};
use std::fmt;

/// Gate verdict for one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPermission {
    Allowed,
    Blocked {
        window: RateLimitKind,
        /// Time left until the window rolls over
        wait: Duration,
    },
}

impl SyncPermission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SyncPermission::Allowed)
    }
}

impl fmt::Display for SyncPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPermission::Allowed => f.write_str("Updates allowed"),
            SyncPermission::Blocked {
                window: RateLimitKind::Daily,
                wait,
            } => write!(
                f,
                "Daily limit reached; please wait {} hours and {} minutes before updating again",
                wait.num_hours(),
                wait.num_minutes() % 60
            ),
            SyncPermission::Blocked {
                window: RateLimitKind::FifteenMinute,
                wait,
            } => write!(
                f,
                "15-minute limit reached; please wait {} minutes before updating again",
                // Round partial minutes up so "0 minutes" is never shown.
                (wait.num_seconds() + 59) / 60
            ),
        }
    }
}

/// Check both rate-limit windows. The daily block takes precedence.
pub fn check(credentials: &Credentials, now: DateTime<Utc>) -> SyncPermission {
    let daily = credentials.last_timeout_daily;
    if now.date_naive() == daily.date_naive() {
        return SyncPermission::Blocked {
            window: RateLimitKind::Daily,
            wait: until_next_midnight(now),
        };
    }

    let fifteen = credentials.last_timeout_15min;
    if same_quarter_hour(now, fifteen) {
        return SyncPermission::Blocked {
            window: RateLimitKind::FifteenMinute,
            wait: until_next_quarter_hour(now),
        };
    }

    SyncPermission::Allowed
}

/// `true` when a sync attempt may start at `now`.
pub fn can_sync(credentials: &Credentials, now: DateTime<Utc>) -> bool {
    check(credentials, now).is_allowed()
}

fn same_quarter_hour(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year()
        && a.ordinal() == b.ordinal()
        && a.hour() == b.hour()
        && a.minute() / 15 == b.minute() / 15
}

fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    let midnight = now
        .date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc());
    match midnight {
        Some(m) => m - now,
        None => Duration::zero(),
    }
}

fn until_next_quarter_hour(now: DateTime<Utc>) -> Duration {
    let quarter = Duration::minutes(15);
    match now.duration_trunc(quarter) {
        Ok(start) => start + quarter - now,
        Err(_) => Duration::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::parse_stamp;
    use chrono::TimeZone;

    fn creds(daily: &str, fifteen: &str) -> Credentials {
        let mut c = Credentials::first_run("1".into(), "s".into(), "r".into());
        c.last_timeout_daily = parse_stamp(daily).unwrap();
        c.last_timeout_15min = parse_stamp(fifteen).unwrap();
        c
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_allowed_when_both_stamps_are_old() {
        let c = creds("2022_01_01_1200", "2022_01_01_1200");
        assert!(can_sync(&c, at(2024, 5, 1, 9, 30)));
    }

    #[test]
    fn test_daily_block_same_utc_date() {
        let c = creds("2024_05_01_0010", "2022_01_01_1200");
        let verdict = check(&c, at(2024, 5, 1, 23, 59));
        assert!(matches!(
            verdict,
            SyncPermission::Blocked {
                window: RateLimitKind::Daily,
                ..
            }
        ));
    }

    #[test]
    fn test_daily_block_ignores_fifteen_minute_stamp() {
        for fifteen in ["2022_01_01_1200", "2024_05_01_0930", "2030_12_31_2359"] {
            let c = creds("2024_05_01_0010", fifteen);
            assert!(!can_sync(&c, at(2024, 5, 1, 9, 31)), "stamp {}", fifteen);
        }
    }

    #[test]
    fn test_daily_block_lifts_after_midnight() {
        let c = creds("2024_05_01_2350", "2022_01_01_1200");
        assert!(can_sync(&c, at(2024, 5, 2, 0, 0)));
    }

    #[test]
    fn test_fifteen_minute_block_same_bucket() {
        let c = creds("2022_01_01_1200", "2024_05_01_0931");
        assert!(!can_sync(&c, at(2024, 5, 1, 9, 30)));
        assert!(!can_sync(&c, at(2024, 5, 1, 9, 44)));
    }

    #[test]
    fn test_fifteen_minute_block_lifts_in_next_bucket() {
        let c = creds("2022_01_01_1200", "2024_05_01_0931");
        assert!(can_sync(&c, at(2024, 5, 1, 9, 45)));
        assert!(can_sync(&c, at(2024, 5, 1, 10, 31)));
        assert!(can_sync(&c, at(2024, 5, 2, 9, 31)));
    }

    #[test]
    fn test_wait_durations() {
        let c = creds("2024_05_01_0010", "2022_01_01_1200");
        let SyncPermission::Blocked { wait, .. } = check(&c, at(2024, 5, 1, 22, 15)) else {
            panic!("expected daily block");
        };
        assert_eq!(wait, Duration::minutes(105));

        let c = creds("2022_01_01_1200", "2024_05_01_0931");
        let SyncPermission::Blocked { wait, .. } = check(&c, at(2024, 5, 1, 9, 37)) else {
            panic!("expected 15-minute block");
        };
        assert_eq!(wait, Duration::minutes(8));
    }

    #[test]
    fn test_display_messages() {
        let c = creds("2024_05_01_0010", "2022_01_01_1200");
        let text = check(&c, at(2024, 5, 1, 22, 15)).to_string();
        assert!(text.contains("1 hours and 45 minutes"), "{}", text);

        let c = creds("2022_01_01_1200", "2024_05_01_0931");
        let text = check(&c, at(2024, 5, 1, 9, 37)).to_string();
        assert!(text.contains("8 minutes"), "{}", text);
    }
}
