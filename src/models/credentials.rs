// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted credential and bookkeeping record (`config.json`).

use crate::time_utils::{parse_stamp, stamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stamp written by first-run setup for every timestamp field.
pub const INITIAL_STAMP: &str = "2022_01_01_1200";

/// OAuth credentials plus rate-limit bookkeeping.
///
/// The on-disk record has exactly these eight fields. Unknown fields and
/// missing fields are both rejected at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    /// True until the first sync attempt has completed
    pub first_run: bool,
    /// When the last sync attempt finished (also names the dataset file)
    #[serde(with = "stamp")]
    pub last_update: DateTime<Utc>,
    /// When the daily quota was last exhausted
    #[serde(with = "stamp")]
    pub last_timeout_daily: DateTime<Utc>,
    /// When the 15-minute quota was last exhausted
    #[serde(with = "stamp")]
    pub last_timeout_15min: DateTime<Utc>,
    /// Pending ids were left behind by a partial update
    pub remaining_updates: bool,
    /// Strava application client ID
    pub client_id: String,
    /// Strava application client secret
    pub client_secret: String,
    /// Long-lived OAuth refresh token
    pub refresh_token: String,
}

impl Credentials {
    /// Fresh record written by first-run setup.
    pub fn first_run(client_id: String, client_secret: String, refresh_token: String) -> Self {
        let initial = parse_stamp(INITIAL_STAMP).unwrap_or_default();
        Self {
            first_run: true,
            last_update: initial,
            last_timeout_daily: initial,
            last_timeout_15min: initial,
            remaining_updates: false,
            client_id,
            client_secret,
            refresh_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> serde_json::Value {
        json!({
            "first_run": false,
            "last_update": "2022_07_15_1344",
            "last_timeout_daily": "2022_07_14_1413",
            "last_timeout_15min": "2022_07_15_1400",
            "remaining_updates": false,
            "client_id": "12345",
            "client_secret": "shh",
            "refresh_token": "refresh"
        })
    }

    #[test]
    fn test_parse_full_record() {
        let creds: Credentials = serde_json::from_value(sample_json()).unwrap();
        assert!(!creds.first_run);
        assert_eq!(creds.client_id, "12345");
        assert_eq!(
            crate::time_utils::format_stamp(creds.last_timeout_15min),
            "2022_07_15_1400"
        );
    }

    #[test]
    fn test_rejects_missing_field() {
        let mut value = sample_json();
        value.as_object_mut().unwrap().remove("refresh_token");
        let err = serde_json::from_value::<Credentials>(value).unwrap_err();
        assert!(err.to_string().contains("refresh_token"));
    }

    #[test]
    fn test_rejects_extra_field() {
        let mut value = sample_json();
        value
            .as_object_mut()
            .unwrap()
            .insert("access_token".to_string(), json!("abc"));
        assert!(serde_json::from_value::<Credentials>(value).is_err());
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        let mut value = sample_json();
        value["last_update"] = json!("yesterday");
        assert!(serde_json::from_value::<Credentials>(value).is_err());
    }

    #[test]
    fn test_serializes_exactly_eight_fields() {
        let creds = Credentials::first_run("1".into(), "2".into(), "3".into());
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 8);
        assert_eq!(value["last_update"], INITIAL_STAMP);
        assert_eq!(value["first_run"], true);
    }
}
