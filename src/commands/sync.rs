// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `sync` command: run one update attempt and persist the result.

use crate::error::Result;
use crate::models::{ActivityLog, Credentials};
use crate::services::{SyncEngine, SyncOutcome, SyncReport};
use crate::AppState;

/// Run the engine and write whatever it hands back.
pub async fn run_and_persist(
    state: &AppState,
    credentials: Credentials,
    log: ActivityLog,
) -> Result<SyncReport> {
    let report = SyncEngine::new(&state.client).run(credentials, log).await;
    persist(state, &report)?;
    Ok(report)
}

/// Write the dataset (when it moved to a new stamp) and then the credentials.
///
/// The dataset goes first so `config.json` never names a file that does
/// not exist.
pub fn persist(state: &AppState, report: &SyncReport) -> Result<()> {
    if matches!(report.outcome, SyncOutcome::Updated { .. }) {
        state.activity_store.save(&report.credentials, &report.log)?;
    }
    state.credential_store.save(&report.credentials)?;
    Ok(())
}

pub async fn handle(state: &AppState) -> Result<SyncReport> {
    let (credentials, log) = super::load_state(state)?;
    tracing::info!(
        activities = log.len(),
        remaining_updates = credentials.remaining_updates,
        "Starting update"
    );

    let report = run_and_persist(state, credentials, log).await?;
    print_report(&report);
    Ok(report)
}

pub fn print_report(report: &SyncReport) {
    println!("{}", report.outcome);
    let orphans = report.outcome.orphans();
    if !orphans.is_empty() {
        println!(
            "There are activities on local which do not exist on Strava: {:?}",
            orphans
        );
    }
    if report.credentials.remaining_updates {
        println!("Some activities are still pending; run `sync` again later.");
    }
    println!("Total activities: {}", report.log.len());
}
