// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-activity sessions and aggregated summary rows.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tabled::Tabled;

/// Label used for the all-types row of each period.
pub const ALL_TYPES: &str = "All";

/// One activity reduced to what the summaries need.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Local start date
    pub date: NaiveDate,
    /// Normalized activity type (Bike, Run, Strength, ...)
    pub kind: String,
    /// Counted duration in hours
    pub hours: f64,
}

/// Grouping period for summary tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Year,
    Month,
}

impl Period {
    /// Grouping key for a date ("2024" or "2024-01").
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Period::Year => format!("{:04}", date.year()),
            Period::Month => format!("{:04}-{:02}", date.year(), date.month()),
        }
    }
}

/// One (period, type) line of a summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Period")]
    pub period: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Total hours, rounded to hundredths
    #[tabled(rename = "Hours")]
    pub duration: f64,
    #[tabled(rename = "Sessions")]
    pub number_of_ex: u32,
    #[tabled(rename = "Days")]
    pub days_of_ex: u32,
}

/// One activity in the spreadsheet-friendly export.
///
/// Times and paces are fractions of a day, so a spreadsheet formats them
/// directly as durations. Metrics that do not apply to the activity type
/// are left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub start_date_local: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    /// Counted duration (elapsed for swims, moving otherwise)
    pub excel_time: f64,
    /// Kilometres; empty for non-distance sports
    pub distance: Option<f64>,
    /// Bike only
    pub average_watts: Option<f64>,
    /// Per kilometre; Run and Hike only
    pub average_pace_run: Option<f64>,
    /// Per 100 metres; Swim only
    pub average_pace_swim: Option<f64>,
    pub calories: Option<f64>,
    /// Empty for swims
    pub average_heartrate: Option<f64>,
}
