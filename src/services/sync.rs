// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental sync of the local dataset against Strava.
//!
//! Handles the core workflow:
//! 1. Ask the rate-limit gate for permission
//! 2. Exchange the refresh token for an access token
//! 3. Fetch the full remote id inventory
//! 4. Diff it against the local dataset
//! 5. Fetch each missing activity until done or rate limited
//! 6. Merge and update the bookkeeping in the credentials
//!
//! [`SyncEngine::run`] never fails: every path hands back the credentials
//! and dataset, with whatever partial progress was made, so the caller can
//! always persist them.

use crate::error::{AppError, RateLimitKind};
use crate::models::{Activity, ActivityLog, Credentials};
use crate::services::rate_gate::{self, SyncPermission};
use crate::services::strava::{AccessToken, StravaClient};
use crate::time_utils::truncate_to_minute;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;

/// Sync state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    FetchingToken,
    ListingRemote,
    Diffing,
    FetchingDetails,
    Merging,
    Done,
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::FetchingToken => "fetching token",
            SyncState::ListingRemote => "listing remote activities",
            SyncState::Diffing => "diffing",
            SyncState::FetchingDetails => "fetching activity details",
            SyncState::Merging => "merging",
            SyncState::Done => "done",
            SyncState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tagged outcome of one state-machine step.
#[derive(Debug)]
pub enum Step<T> {
    Proceed(T),
    RateLimited(RateLimitKind),
    Fatal(AppError),
}

impl<T> From<Result<T, AppError>> for Step<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(value) => Step::Proceed(value),
            Err(e) => match e.rate_limit_kind() {
                Some(kind) => Step::RateLimited(kind),
                None => Step::Fatal(e),
            },
        }
    }
}

/// What a sync attempt achieved.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The gate refused; nothing was attempted.
    Blocked(SyncPermission),
    /// Aborted before any record could be fetched.
    Failed { at: SyncState, error: AppError },
    /// Remote and local agree; no detail fetches were needed.
    UpToDate { orphans: Vec<u64> },
    /// Detail fetches ran, possibly stopped early.
    ///
    /// An `interrupted` attempt ends `Failed`, but the records fetched
    /// before the failure are still merged.
    Updated {
        added: usize,
        /// Pending ids not fetched in this attempt
        remaining: Vec<u64>,
        /// Rate limit that stopped the fetch loop
        halted_by: Option<RateLimitKind>,
        /// Unclassified failure that stopped the fetch loop
        interrupted: Option<AppError>,
        orphans: Vec<u64>,
    },
}

impl SyncOutcome {
    /// Terminal state this outcome corresponds to.
    pub fn state(&self) -> SyncState {
        match self {
            SyncOutcome::Blocked(_)
            | SyncOutcome::Failed { .. }
            | SyncOutcome::Updated {
                interrupted: Some(_),
                ..
            } => SyncState::Failed,
            SyncOutcome::UpToDate { .. } | SyncOutcome::Updated { .. } => SyncState::Done,
        }
    }

    /// Local ids missing from the remote inventory, when a diff was made.
    pub fn orphans(&self) -> &[u64] {
        match self {
            SyncOutcome::UpToDate { orphans } | SyncOutcome::Updated { orphans, .. } => orphans,
            _ => &[],
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Blocked(permission) => write!(f, "Update skipped: {}", permission),
            SyncOutcome::Failed { at, error } => {
                write!(f, "Update failed while {}: {}", at, error)
            }
            SyncOutcome::UpToDate { .. } => f.write_str("No new activities"),
            SyncOutcome::Updated {
                added,
                remaining,
                halted_by,
                interrupted,
                ..
            } => {
                write!(f, "Added {} activities", added)?;
                if !remaining.is_empty() {
                    write!(f, "; {} still pending", remaining.len())?;
                }
                if let Some(kind) = halted_by {
                    write!(f, " ({} rate limit reached)", kind)?;
                }
                if let Some(e) = interrupted {
                    write!(f, " (stopped: {})", e)?;
                }
                Ok(())
            }
        }
    }
}

/// Everything a sync attempt hands back to its caller.
#[derive(Debug)]
pub struct SyncReport {
    pub credentials: Credentials,
    pub log: ActivityLog,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    pub fn state(&self) -> SyncState {
        self.outcome.state()
    }
}

/// Orchestrates one sync attempt against a [`StravaClient`].
pub struct SyncEngine<'a> {
    client: &'a StravaClient,
    clock: fn() -> DateTime<Utc>,
}

impl<'a> SyncEngine<'a> {
    pub fn new(client: &'a StravaClient) -> Self {
        Self {
            client,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock (tests).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        truncate_to_minute((self.clock)())
    }

    /// Run one sync attempt to a terminal state.
    pub async fn run(&self, mut credentials: Credentials, mut log: ActivityLog) -> SyncReport {
        let mut state = SyncState::Idle;

        // ─── Idle: consult the gate ──────────────────────────────────────
        let permission = rate_gate::check(&credentials, (self.clock)());
        if !permission.is_allowed() {
            tracing::info!(%permission, "Sync skipped by rate-limit gate");
            return SyncReport {
                credentials,
                log,
                outcome: SyncOutcome::Blocked(permission),
            };
        }

        // ─── FetchingToken ───────────────────────────────────────────────
        state = self.advance(state, SyncState::FetchingToken);
        // The token endpoint carries no rate-limit headers; every failure is fatal.
        let token: AccessToken = match self
            .client
            .refresh_access_token(
                &credentials.client_id,
                &credentials.client_secret,
                &credentials.refresh_token,
            )
            .await
        {
            Ok(token) => token,
            Err(error) => return self.failed(credentials, log, state, error),
        };

        // ─── ListingRemote ───────────────────────────────────────────────
        state = self.advance(state, SyncState::ListingRemote);
        let listing_step = match self.client.list_activity_ids(&token).await {
            Ok(listing) => match listing.halted_by {
                Some(kind) => Step::RateLimited(kind),
                None => Step::Proceed(listing.ids),
            },
            Err(e) => Step::from(Err(e)),
        };
        let inventory = match listing_step {
            Step::Proceed(ids) => ids,
            Step::RateLimited(kind) => {
                self.record_timeout(&mut credentials, kind);
                tracing::warn!("Activity list cannot be fetched");
                return self.failed(credentials, log, state, AppError::rate_limited(kind));
            }
            Step::Fatal(error) => return self.failed(credentials, log, state, error),
        };

        // ─── Diffing ─────────────────────────────────────────────────────
        state = self.advance(state, SyncState::Diffing);
        let (pending, orphans) = diff(&credentials, &log, &inventory);
        tracing::info!(
            inventory = inventory.len(),
            local = log.len(),
            pending = pending.len(),
            "Computed pending activities"
        );
        if !orphans.is_empty() {
            tracing::warn!(
                ?orphans,
                "There are activities on local which do not exist on Strava"
            );
        }
        if pending.is_empty() {
            self.advance(state, SyncState::Done);
            tracing::info!("No new activities");
            return SyncReport {
                credentials,
                log,
                outcome: SyncOutcome::UpToDate { orphans },
            };
        }

        // ─── FetchingDetails ─────────────────────────────────────────────
        state = self.advance(state, SyncState::FetchingDetails);
        let mut fetched: Vec<Activity> = Vec::new();
        let mut halted_by = None;
        let mut interrupted = None;
        for &id in &pending {
            match Step::from(self.client.get_activity(&token, id).await) {
                Step::Proceed(activity) => {
                    tracing::debug!(activity_id = activity.id, "Fetched activity");
                    fetched.push(activity);
                }
                Step::RateLimited(kind) => {
                    tracing::warn!(activity_id = id, limit = %kind, "Rate limit hit, stopping fetch");
                    self.record_timeout(&mut credentials, kind);
                    halted_by = Some(kind);
                    break;
                }
                Step::Fatal(error) => {
                    tracing::error!(activity_id = id, error = %error, "Activity fetch failed, stopping fetch");
                    interrupted = Some(error);
                    break;
                }
            }
        }

        // ─── Merging ─────────────────────────────────────────────────────
        state = self.advance(state, SyncState::Merging);
        credentials.last_update = self.now();
        credentials.first_run = false;

        let fetched_ids: HashSet<u64> = fetched.iter().map(|a| a.id).collect();
        let remaining: Vec<u64> = pending
            .iter()
            .copied()
            .filter(|id| !fetched_ids.contains(id))
            .collect();
        credentials.remaining_updates = !remaining.is_empty();

        let added = if fetched.is_empty() {
            tracing::info!("No updates fetched from pending list");
            0
        } else {
            let added = log.merge(fetched);
            tracing::info!(added, total = log.len(), "Database updated");
            added
        };

        let outcome = SyncOutcome::Updated {
            added,
            remaining,
            halted_by,
            interrupted,
            orphans,
        };
        self.advance(state, outcome.state());
        SyncReport {
            credentials,
            log,
            outcome,
        }
    }

    fn advance(&self, from: SyncState, to: SyncState) -> SyncState {
        tracing::debug!(%from, %to, "Sync state transition");
        to
    }

    fn record_timeout(&self, credentials: &mut Credentials, kind: RateLimitKind) {
        let now = self.now();
        match kind {
            RateLimitKind::Daily => credentials.last_timeout_daily = now,
            RateLimitKind::FifteenMinute => credentials.last_timeout_15min = now,
        }
    }

    fn failed(
        &self,
        credentials: Credentials,
        log: ActivityLog,
        at: SyncState,
        error: AppError,
    ) -> SyncReport {
        self.advance(at, SyncState::Failed);
        tracing::error!(state = %at, error = %error, "Sync attempt failed");
        SyncReport {
            credentials,
            log,
            outcome: SyncOutcome::Failed { at, error },
        }
    }
}

/// Pending ids (inventory order) and orphan ids for one attempt.
///
/// On the first run everything remote is pending and orphans are not
/// checked.
pub fn diff(credentials: &Credentials, log: &ActivityLog, inventory: &[u64]) -> (Vec<u64>, Vec<u64>) {
    if credentials.first_run {
        let mut seen = HashSet::new();
        let pending = inventory.iter().copied().filter(|id| seen.insert(*id)).collect();
        return (pending, Vec::new());
    }
    (log.pending_ids(inventory), log.orphan_ids(inventory))
}
