// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod credentials;
pub mod summary;

pub use activity::{Activity, ActivityError, ActivityLog};
pub use credentials::Credentials;
pub use summary::{ExportRow, Period, Session, SummaryRow};
