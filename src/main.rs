// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-Tracker CLI
//!
//! Keeps a local CSV copy of a Strava athlete's activities, fetching only
//! what is missing and stopping cleanly when Strava's rate limits are hit.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use strava_tracker::{
    commands::{self, setup::SetupArgs},
    config::Config,
    services::{SyncReport, SyncState},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "strava-tracker")]
#[command(author, version, about = "Sync and summarize Strava activities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding config.json and the activity CSV files
    #[arg(short, long, global = true, env = "STRAVA_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize the application and run the first update
    Setup {
        /// Client ID from the Strava API settings page
        #[arg(long, env = "STRAVA_CLIENT_ID")]
        client_id: String,
        /// Client secret from the Strava API settings page
        #[arg(long, env = "STRAVA_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
        /// Authorization code (prompted for if omitted)
        #[arg(long)]
        code: Option<String>,
        /// Overwrite an existing config.json
        #[arg(long)]
        force: bool,
    },
    /// Show the last update and rate-limit status
    Status,
    /// Fetch activities missing from the local dataset
    Sync,
    /// Print yearly and monthly summary tables
    Analyze,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let state = AppState::new(config)?;

    match cli.command {
        Commands::Setup {
            client_id,
            client_secret,
            code,
            force,
        } => {
            let args = SetupArgs {
                client_id,
                client_secret,
                code,
                force,
            };
            let report = commands::setup::handle(&state, args).await?;
            log_failure(&report);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            commands::status::handle(&state)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sync => {
            let report = commands::sync::handle(&state).await?;
            log_failure(&report);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Analyze => {
            let written = commands::analyze::handle(&state)?;
            tracing::info!(files = written.len(), "Summary tables saved");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// A failed attempt has already been persisted; it is not a process error.
fn log_failure(report: &SyncReport) {
    if report.state() == SyncState::Failed {
        tracing::warn!(outcome = %report.outcome, "Update did not complete");
    }
}

/// Initialize logging on stderr; `LOG_FORMAT=json` switches to structured JSON.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("strava_tracker=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
