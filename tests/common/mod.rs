// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::path::Path;
use strava_tracker::config::Config;
use strava_tracker::models::{Activity, ActivityLog, Credentials};
use strava_tracker::services::StravaClient;
use strava_tracker::AppState;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_TOKEN: &str = "test-access-token";
pub const REFRESH_TOKEN: &str = "test-refresh-token";

/// Fixed wall clock for engine tests: 2024-05-01 09:31:42 UTC.
#[allow(dead_code)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 31, 42).unwrap()
}

/// `fixed_now` truncated to the minute, as recorded in credentials.
#[allow(dead_code)]
pub fn fixed_minute() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 31, 0).unwrap()
}

/// Config pointing both API bases at the mock server.
#[allow(dead_code)]
pub fn test_config(server: &MockServer, data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        ..Config::with_base_url(&server.uri())
    }
}

#[allow(dead_code)]
pub fn test_client(server: &MockServer) -> StravaClient {
    StravaClient::new(&Config::with_base_url(&server.uri())).expect("Failed to build client")
}

#[allow(dead_code)]
pub fn test_state(server: &MockServer, data_dir: &Path) -> AppState {
    AppState::new(test_config(server, data_dir)).expect("Failed to build app state")
}

/// Credentials as written by setup.
#[allow(dead_code)]
pub fn first_run_credentials() -> Credentials {
    Credentials::first_run("12345".into(), "test-secret".into(), REFRESH_TOKEN.into())
}

/// Credentials after an earlier successful sync.
#[allow(dead_code)]
pub fn synced_credentials() -> Credentials {
    let mut creds = first_run_credentials();
    creds.first_run = false;
    creds.last_update = Utc.with_ymd_and_hms(2024, 4, 30, 20, 0, 0).unwrap();
    creds
}

/// Detail payload as returned by `GET /activities/{id}`.
#[allow(dead_code)]
pub fn activity_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Activity {}", id),
        "type": "Run",
        "sport_type": "Run",
        "start_date_local": "2024-04-30T07:00:00Z",
        "moving_time": 1800,
        "elapsed_time": 1900,
        "distance": 5000.5,
        "athlete": { "id": 7, "resource_state": 1 },
        "map": { "id": format!("a{}", id), "summary_polyline": "u{~vFvyys@fS]" },
        "segment_efforts": [{ "id": id * 100, "name": "Hill" }]
    })
}

/// Local dataset holding the given ids.
#[allow(dead_code)]
pub fn log_with(ids: &[u64]) -> ActivityLog {
    let mut log = ActivityLog::new();
    log.merge(
        ids.iter()
            .map(|id| Activity::from_json(activity_json(*id)).expect("valid activity")),
    );
    log
}

/// A 429 carrying the given `"15min,daily"` limit and usage headers.
#[allow(dead_code)]
pub fn rate_limited(limit: &str, usage: &str) -> ResponseTemplate {
    ResponseTemplate::new(429)
        .insert_header("X-RateLimit-Limit", limit)
        .insert_header("X-RateLimit-Usage", usage)
        .set_body_json(json!({ "message": "Rate Limit Exceeded" }))
}

/// 15-minute window used up, daily window still open.
#[allow(dead_code)]
pub fn fifteen_minute_limited() -> ResponseTemplate {
    rate_limited("100,1000", "101,450")
}

/// Daily window used up.
#[allow(dead_code)]
pub fn daily_limited() -> ResponseTemplate {
    rate_limited("100,1000", "20,1000")
}

/// Token endpoint granting an access token for the refresh grant.
#[allow(dead_code)]
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": ACCESS_TOKEN,
            "expires_at": 1_714_560_000,
            "expires_in": 21600,
            "refresh_token": REFRESH_TOKEN
        })))
        .mount(server)
        .await;
}

/// Listing pages 1..=n with the given ids, then an empty page.
#[allow(dead_code)]
pub async fn mount_listing(server: &MockServer, pages: &[&[u64]]) {
    for (i, ids) in pages.iter().enumerate() {
        let items: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "id": id, "name": format!("Activity {}", id) }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete/activities"))
            .and(query_param("page", (i + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(items))
            .expect(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(query_param("page", (pages.len() + 1).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(server)
        .await;
}

/// Detail endpoint for one id, expected `times` times.
#[allow(dead_code)]
pub async fn mount_activity_response(server: &MockServer, id: u64, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v3/activities/{}", id)))
        .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

/// Detail endpoint for each id, each expected exactly once.
#[allow(dead_code)]
pub async fn mount_activities(server: &MockServer, ids: &[u64]) {
    for &id in ids {
        mount_activity_response(
            server,
            id,
            ResponseTemplate::new(200).set_body_json(activity_json(id)),
            1,
        )
        .await;
    }
}
