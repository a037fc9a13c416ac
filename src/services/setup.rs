// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! First-run setup: validate app credentials and obtain a refresh token.

use crate::config::Config;
use crate::error::AppError;
use crate::models::Credentials;
use crate::services::strava::StravaClient;

/// Scope needed to list private activities.
pub const REQUIRED_SCOPE: &str = "activity:read_all";

/// Validate the client ID shown on the Strava API settings page.
pub fn validate_client_id(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Setup("Empty client id".to_string()));
    }
    trimmed
        .parse::<u64>()
        .map(|id| id.to_string())
        .map_err(|_| AppError::Setup(format!("Client id is not an integer: {:?}", trimmed)))
}

/// Validate a non-empty secret or code.
pub fn validate_non_empty(what: &str, raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Setup(format!("Empty {}", what)));
    }
    Ok(trimmed.to_string())
}

/// URL the user opens to authorize the application.
pub fn authorization_url(config: &Config, client_id: &str) -> String {
    format!(
        "{}/authorize?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         scope={}",
        config.oauth_base_url,
        urlencoding::encode(client_id),
        urlencoding::encode(&config.redirect_uri),
        REQUIRED_SCOPE
    )
}

/// Exchange the authorization code and build a fresh credential record.
pub async fn complete_setup(
    client: &StravaClient,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<Credentials, AppError> {
    let client_id = validate_client_id(client_id)?;
    let client_secret = validate_non_empty("client secret", client_secret)?;
    let code = validate_non_empty("authorization code", code)?;

    let response = client
        .exchange_authorization_code(&client_id, &client_secret, &code)
        .await?;

    if let Some(athlete) = &response.athlete {
        tracing::info!(
            athlete_id = athlete.id,
            firstname = athlete.firstname.as_deref().unwrap_or(""),
            "Strava application authorized"
        );
    }

    Ok(Credentials::first_run(
        client_id,
        client_secret,
        response.refresh_token,
    ))
}
