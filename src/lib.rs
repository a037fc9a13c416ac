// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava-Tracker: keep a local copy of your Strava activities
//!
//! This crate syncs activities from the Strava API into flat files,
//! respecting Strava's 15-minute and daily rate limits, and builds
//! summary tables from the local dataset.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use error::Result;
use services::StravaClient;
use store::{ActivityStore, CredentialStore};

/// Shared application state, built once per invocation.
pub struct AppState {
    pub config: Config,
    pub client: StravaClient,
    pub credential_store: CredentialStore,
    pub activity_store: ActivityStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = StravaClient::new(&config)?;
        let credential_store = CredentialStore::new(&config.data_dir);
        let activity_store = ActivityStore::new(&config.data_dir);
        Ok(Self {
            config,
            client,
            credential_store,
            activity_store,
        })
    }
}
