// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

use std::fmt;

/// Which Strava quota window was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// Rolling 15-minute window.
    FifteenMinute,
    /// Calendar-day window (UTC).
    Daily,
}

impl fmt::Display for RateLimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitKind::FifteenMinute => f.write_str("15-minute"),
            RateLimitKind::Daily => f.write_str("daily"),
        }
    }
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Strava rejected the credential exchange: {0}")]
    Auth(String),

    #[error("Strava daily rate limit exceeded")]
    DailyLimitExceeded,

    #[error("Strava 15-minute rate limit exceeded")]
    FifteenMinuteLimitExceeded,

    #[error("Strava request failed: {0}")]
    RequestFailed(String),

    #[error("Config file in invalid format: {0}")]
    ConfigFormat(String),

    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Build the error for an exhausted quota window.
    pub fn rate_limited(kind: RateLimitKind) -> Self {
        match kind {
            RateLimitKind::FifteenMinute => AppError::FifteenMinuteLimitExceeded,
            RateLimitKind::Daily => AppError::DailyLimitExceeded,
        }
    }

    /// The quota window this error stands for, if it is a rate-limit signal.
    pub fn rate_limit_kind(&self) -> Option<RateLimitKind> {
        match self {
            AppError::DailyLimitExceeded => Some(RateLimitKind::Daily),
            AppError::FifteenMinuteLimitExceeded => Some(RateLimitKind::FifteenMinute),
            _ => None,
        }
    }

    /// Check if this error is an expected, wait-it-out rate-limit signal.
    pub fn is_rate_limit(&self) -> bool {
        self.rate_limit_kind().is_some()
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
