// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching activities.
//!
//! Handles:
//! - Refresh-token and authorization-code exchanges
//! - Paginated activity listing (id inventory)
//! - Detailed activity fetching
//! - Rate limit classification from `X-RateLimit-*` headers

use crate::config::Config;
use crate::error::{AppError, RateLimitKind};
use crate::models::Activity;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Header carrying the `"15min,daily"` quota.
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Header carrying the `"15min,daily"` usage.
pub const RATE_LIMIT_USAGE_HEADER: &str = "x-ratelimit-usage";

/// Short-lived bearer token returned by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_base_url: String,
    oauth_base_url: String,
    per_page: u32,
}

impl StravaClient {
    /// Create a new Strava client from the application config.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for Strava requests");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.clone(),
            oauth_base_url: config.oauth_base_url.clone(),
            per_page: config.per_page,
        })
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// A rejected exchange is an [`AppError::Auth`]; it is never retried.
    pub async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<AccessToken, AppError> {
        tracing::info!("Requesting access token");
        let response: TokenRefreshResponse = self
            .post_token(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        tracing::debug!(expires_at = response.expires_at, "Access token granted");
        Ok(AccessToken(response.access_token))
    }

    /// Exchange a one-time authorization code for tokens (first-run setup).
    pub async fn exchange_authorization_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<TokenExchangeResponse, AppError> {
        tracing::info!("Exchanging authorization code for refresh token");
        self.post_token(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    /// POST a form to the OAuth token endpoint.
    async fn post_token<T: for<'de> Deserialize<'de>>(
        &self,
        form: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let url = format!("{}/token", self.oauth_base_url);
        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::RequestFailed(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::Auth(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))
    }

    /// Fetch one page of the athlete's activity listing.
    pub async fn list_activities_page(
        &self,
        token: &AccessToken,
        page: u32,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{}/athlete/activities", self.api_base_url);
        let params = [
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ];

        match self.fetch_json(&url, token, &params).await? {
            Value::Array(items) => Ok(items),
            other => Err(AppError::RequestFailed(format!(
                "Expected an array from the activity listing, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Fetch the full remote id inventory, one page at a time.
    ///
    /// Pagination ends at the first empty page. A rate-limit signal stops
    /// further requests; ids from the pages already fetched are kept in the
    /// returned [`Listing`]. Any other failure is returned as an error.
    pub async fn list_activity_ids(&self, token: &AccessToken) -> Result<Listing, AppError> {
        tracing::info!("Requesting activity id list from Strava");
        let mut listing = Listing::default();
        let mut page = 1;

        loop {
            let items = match self.list_activities_page(token, page).await {
                Ok(items) => items,
                Err(e) => match e.rate_limit_kind() {
                    Some(kind) => {
                        tracing::warn!(page, limit = %kind, "Rate limit hit while listing activities");
                        listing.halted_by = Some(kind);
                        return Ok(listing);
                    }
                    None => return Err(e),
                },
            };

            if items.is_empty() {
                break;
            }

            for item in &items {
                let id = item.get("id").and_then(Value::as_u64).ok_or_else(|| {
                    AppError::RequestFailed(format!("Listing page {} has an entry without id", page))
                })?;
                listing.ids.push(id);
            }

            tracing::debug!(page, count = items.len(), "Fetched listing page");
            listing.pages += 1;
            page += 1;
        }

        tracing::info!(pages = listing.pages, total = listing.ids.len(), "Activity id list complete");
        Ok(listing)
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        token: &AccessToken,
        activity_id: u64,
    ) -> Result<Activity, AppError> {
        let url = format!("{}/activities/{}", self.api_base_url, activity_id);
        let value = self.fetch_json(&url, token, &[]).await?;
        Activity::from_json(value).map_err(|e| {
            AppError::RequestFailed(format!("Activity {}: {}", activity_id, e))
        })
    }

    /// Generic GET request with JSON response and rate-limit classification.
    pub async fn fetch_json(
        &self,
        url: &str,
        token: &AccessToken,
        params: &[(&str, String)],
    ) -> Result<Value, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &headers, &body));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::RequestFailed(format!("JSON parse error: {}", e)))
    }
}

/// Map a non-success response onto the error taxonomy.
///
/// Daily exhaustion wins over 15-minute exhaustion. Missing or malformed
/// rate-limit headers make the failure unclassified.
pub fn classify_failure(status: StatusCode, headers: &HeaderMap, body: &str) -> AppError {
    match RateLimitSnapshot::from_headers(headers).and_then(|s| s.exhausted()) {
        Some(kind) => {
            tracing::warn!(status = %status, limit = %kind, "Strava rate limit hit");
            AppError::rate_limited(kind)
        }
        None => {
            tracing::error!(status = %status, body = %body, "Strava request failed");
            AppError::RequestFailed(format!("HTTP {}: {}", status, body))
        }
    }
}

/// Quota and usage for both windows, as reported on a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub limit_15min: u32,
    pub limit_daily: u32,
    pub usage_15min: u32,
    pub usage_daily: u32,
}

impl RateLimitSnapshot {
    /// Parse the `X-RateLimit-Limit` / `X-RateLimit-Usage` pair.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let (limit_15min, limit_daily) = parse_pair(headers.get(RATE_LIMIT_LIMIT_HEADER)?.to_str().ok()?)?;
        let (usage_15min, usage_daily) = parse_pair(headers.get(RATE_LIMIT_USAGE_HEADER)?.to_str().ok()?)?;
        Some(Self {
            limit_15min,
            limit_daily,
            usage_15min,
            usage_daily,
        })
    }

    /// The window that is used up, daily first.
    pub fn exhausted(&self) -> Option<RateLimitKind> {
        if self.usage_daily >= self.limit_daily {
            Some(RateLimitKind::Daily)
        } else if self.usage_15min >= self.limit_15min {
            Some(RateLimitKind::FifteenMinute)
        } else {
            None
        }
    }
}

/// Parse `"a,b"` into two integers.
fn parse_pair(value: &str) -> Option<(u32, u32)> {
    let (first, second) = value.split_once(',')?;
    Some((first.trim().parse().ok()?, second.trim().parse().ok()?))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Result of walking the paginated activity listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Ids in listing order
    pub ids: Vec<u64>,
    /// Number of non-empty pages fetched
    pub pages: u32,
    /// Set when a rate limit stopped pagination early
    pub halted_by: Option<RateLimitKind>,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.halted_by.is_none()
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub expires_at: i64,
}

/// Authorization-code exchange response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub athlete: Option<StravaAthlete>,
}

/// Athlete info from the OAuth token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}
