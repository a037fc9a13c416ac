// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command handlers, one per CLI subcommand.

pub mod analyze;
pub mod setup;
pub mod status;
pub mod sync;

use crate::error::{AppError, Result};
use crate::models::{ActivityLog, Credentials};
use crate::AppState;

/// Load the credential record and the dataset it points at.
pub fn load_state(state: &AppState) -> Result<(Credentials, ActivityLog)> {
    if !state.credential_store.exists() {
        return Err(AppError::Setup(format!(
            "{} not found; run `strava-tracker setup` first",
            state.credential_store.path().display()
        )));
    }
    let credentials = state.credential_store.load()?;
    let log = state.activity_store.load(&credentials)?;
    Ok((credentials, log))
}
