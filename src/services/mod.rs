// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod analysis;
pub mod rate_gate;
pub mod setup;
pub mod strava;
pub mod sync;

pub use analysis::SummaryTables;
pub use rate_gate::SyncPermission;
pub use strava::{AccessToken, StravaClient};
pub use sync::{SyncEngine, SyncOutcome, SyncReport, SyncState};
