// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `setup` command: authorize the app, write `config.json`, run the first sync.

use crate::error::{AppError, Result};
use crate::models::ActivityLog;
use crate::services::setup::{authorization_url, complete_setup, validate_client_id};
use crate::services::SyncReport;
use crate::AppState;
use std::io::{self, BufRead, Write};

pub struct SetupArgs {
    pub client_id: String,
    pub client_secret: String,
    pub code: Option<String>,
    pub force: bool,
}

pub async fn handle(state: &AppState, args: SetupArgs) -> Result<SyncReport> {
    if state.credential_store.exists() && !args.force {
        return Err(AppError::Setup(format!(
            "{} already exists; pass --force to overwrite it",
            state.credential_store.path().display()
        )));
    }

    let client_id = validate_client_id(&args.client_id)?;
    let code = match args.code {
        Some(code) => code,
        None => prompt_for_code(&authorization_url(&state.config, &client_id))?,
    };

    let credentials =
        complete_setup(&state.client, &client_id, &args.client_secret, &code).await?;
    state.credential_store.save(&credentials)?;
    println!(
        "Credentials saved to {}",
        state.credential_store.path().display()
    );

    println!("Running first update; this may take a while.");
    let report = super::sync::run_and_persist(state, credentials, ActivityLog::new()).await?;
    super::sync::print_report(&report);
    Ok(report)
}

fn prompt_for_code(url: &str) -> Result<String> {
    println!("Open this URL, authorize the application, and copy the `code`");
    println!("parameter from the page you are redirected to:\n");
    println!("  {}\n", url);
    print!("Code: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
