// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! This is the only runtime knob set: the Strava client and the stores
//! receive it explicitly, nothing reads the environment after startup.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `config.json` and the activity CSV files
    pub data_dir: PathBuf,
    /// Strava REST API base (`/athlete/activities`, `/activities/{id}`)
    pub api_base_url: String,
    /// Strava OAuth base (`/token`, `/authorize`)
    pub oauth_base_url: String,
    /// Page size for the activity listing
    pub per_page: u32,
    /// Transport timeout for every HTTP call
    pub http_timeout_secs: u64,
    /// Skip TLS certificate verification (opt-in only)
    pub accept_invalid_certs: bool,
    /// Redirect URI registered with the Strava application
    pub redirect_uri: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            api_base_url: "https://www.strava.com/api/v3".to_string(),
            oauth_base_url: "https://www.strava.com/oauth".to_string(),
            per_page: 200,
            http_timeout_secs: 30,
            accept_invalid_certs: false,
            redirect_uri: "http://localhost".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            data_dir: env::var("STRAVA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            api_base_url: env::var("STRAVA_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            oauth_base_url: env::var("STRAVA_OAUTH_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.oauth_base_url),
            per_page: parse_var("STRAVA_PER_PAGE")?.unwrap_or(defaults.per_page),
            http_timeout_secs: parse_var("STRAVA_HTTP_TIMEOUT_SECS")?
                .unwrap_or(defaults.http_timeout_secs),
            accept_invalid_certs: parse_var("STRAVA_ACCEPT_INVALID_CERTS")?
                .unwrap_or(defaults.accept_invalid_certs),
            redirect_uri: env::var("STRAVA_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
        })
        .and_then(Self::validated)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.per_page == 0 {
            return Err(ConfigError::Invalid {
                name: "STRAVA_PER_PAGE",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }

    /// Point both API bases at one mock server (tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: format!("{}/api/v3", base_url),
            oauth_base_url: format!("{}/oauth", base_url),
            ..Self::default()
        }
    }
}

/// Parse an optional environment variable into `T`.
fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("STRAVA_DATA_DIR", "/tmp/strava-test");
        env::set_var("STRAVA_PER_PAGE", "50");
        env::set_var("STRAVA_API_BASE_URL", "http://127.0.0.1:9000/api/v3/");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.data_dir, PathBuf::from("/tmp/strava-test"));
        assert_eq!(config.per_page, 50);
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000/api/v3");
        assert!(!config.accept_invalid_certs);

        env::remove_var("STRAVA_DATA_DIR");
        env::remove_var("STRAVA_PER_PAGE");
        env::remove_var("STRAVA_API_BASE_URL");
    }

    #[test]
    fn test_default_verifies_certificates() {
        let config = Config::default();
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.per_page, 200);
    }

    #[test]
    fn test_with_base_url() {
        let config = Config::with_base_url("http://127.0.0.1:1234");
        assert_eq!(config.api_base_url, "http://127.0.0.1:1234/api/v3");
        assert_eq!(config.oauth_base_url, "http://127.0.0.1:1234/oauth");
    }
}
