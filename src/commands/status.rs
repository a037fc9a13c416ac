// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `status` command: show sync bookkeeping without touching the network.

use crate::error::Result;
use crate::services::rate_gate;
use crate::time_utils::format_stamp;
use crate::AppState;
use chrono::Utc;

pub fn handle(state: &AppState) -> Result<()> {
    let (credentials, log) = super::load_state(state)?;

    if credentials.first_run {
        println!("Not synced yet");
    } else {
        println!("Last update: {}", format_stamp(credentials.last_update));
    }
    println!("Activities: {}", log.len());
    if credentials.remaining_updates {
        println!("Pending activities remain from the last update");
    }
    println!("{}", rate_gate::check(&credentials, Utc::now()));
    Ok(())
}
