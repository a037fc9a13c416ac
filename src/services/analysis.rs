// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Summary tables: time spent, sessions and active days per period/type.

use crate::error::Result;
use crate::models::summary::ALL_TYPES;
use crate::models::{Activity, ActivityLog, ExportRow, Period, Session, SummaryRow};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Types whose distance is not meaningful.
const NON_DISTANCE_TYPES: [&str; 3] = ["Strength", "Yoga", "RockClimbing"];

/// Metric columns of the pivoted table, in column order.
const PIVOT_METRICS: [&str; 3] = ["days_of_ex", "duration", "number_of_ex"];

/// Fold equivalent Strava activity types together.
pub fn normalize_type(raw: &str) -> &str {
    match raw {
        "VirtualRide" | "Ride" => "Bike",
        "WeightTraining" | "Workout" => "Strength",
        other => other,
    }
}

fn start_date(activity: &Activity) -> Option<NaiveDate> {
    activity
        .str_attr("start_date_local")
        .and_then(|s| s.get(..10))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn activity_kind(activity: &Activity) -> String {
    normalize_type(
        activity
            .str_attr("type")
            .or_else(|| activity.str_attr("sport_type"))
            .unwrap_or("Unknown"),
    )
    .to_string()
}

/// Swims are counted by elapsed time.
fn counted_seconds(activity: &Activity, kind: &str) -> f64 {
    if kind == "Swim" {
        activity.f64_attr("elapsed_time")
    } else {
        activity.f64_attr("moving_time")
    }
    .unwrap_or(0.0)
}

/// Reduce an activity to a session; `None` if it has no usable start date.
pub fn session_from_activity(activity: &Activity) -> Option<Session> {
    let date = start_date(activity)?;
    let kind = activity_kind(activity);
    let hours = counted_seconds(activity, &kind) / SECONDS_PER_HOUR;
    Some(Session { date, kind, hours })
}

/// Spreadsheet row for an activity; `None` if it has no usable start date.
pub fn export_row(activity: &Activity) -> Option<ExportRow> {
    let date = start_date(activity)?;
    let kind = activity_kind(activity);
    // Days per metre at the average speed.
    let day_per_metre = activity
        .f64_attr("average_speed")
        .filter(|speed| *speed > 0.0)
        .map(|speed| 1.0 / (speed * SECONDS_PER_DAY));

    Some(ExportRow {
        start_date_local: date,
        excel_time: counted_seconds(activity, &kind) / SECONDS_PER_DAY,
        distance: activity
            .f64_attr("distance")
            .filter(|_| !NON_DISTANCE_TYPES.contains(&kind.as_str()))
            .map(|metres| metres / 1000.0),
        average_watts: activity.f64_attr("average_watts").filter(|_| kind == "Bike"),
        average_pace_run: day_per_metre
            .filter(|_| kind == "Run" || kind == "Hike")
            .map(|pace| pace * 1000.0),
        average_pace_swim: day_per_metre
            .filter(|_| kind == "Swim")
            .map(|pace| pace * 100.0),
        calories: activity.f64_attr("calories"),
        average_heartrate: activity
            .f64_attr("average_heartrate")
            .filter(|_| kind != "Swim"),
        kind,
    })
}

/// Export rows for the whole dataset, in dataset order.
pub fn clean_export(log: &ActivityLog) -> Vec<ExportRow> {
    log.iter().filter_map(export_row).collect()
}

/// All sessions in the dataset, oldest first.
pub fn prepare_sessions(log: &ActivityLog) -> Vec<Session> {
    let mut sessions: Vec<Session> = log
        .iter()
        .filter_map(|activity| {
            let session = session_from_activity(activity);
            if session.is_none() {
                tracing::debug!(activity_id = activity.id, "Skipping activity without start date");
            }
            session
        })
        .collect();
    sessions.sort_by_key(|s| s.date);
    sessions
}

/// Sessions whose day-of-year is not later than `today`'s, for every year.
pub fn year_to_date(sessions: &[Session], today: NaiveDate) -> Vec<Session> {
    sessions
        .iter()
        .filter(|s| s.date.ordinal() <= today.ordinal())
        .cloned()
        .collect()
}

#[derive(Default)]
struct Bucket {
    hours: f64,
    count: u32,
    days: BTreeSet<NaiveDate>,
}

impl Bucket {
    fn add(&mut self, session: &Session) {
        self.hours += session.hours;
        self.count += 1;
        self.days.insert(session.date);
    }
}

/// Group sessions by (period, type) plus an `All` row per period.
pub fn summary_table(sessions: &[Session], period: Period) -> Vec<SummaryRow> {
    let mut buckets: BTreeMap<(String, String), Bucket> = BTreeMap::new();

    for session in sessions {
        let key = period.key(session.date);
        buckets
            .entry((key.clone(), session.kind.clone()))
            .or_default()
            .add(session);
        buckets
            .entry((key, ALL_TYPES.to_string()))
            .or_default()
            .add(session);
    }

    buckets
        .into_iter()
        .map(|((period, kind), bucket)| SummaryRow {
            period,
            kind,
            duration: (bucket.hours * 100.0).round() / 100.0,
            number_of_ex: bucket.count,
            days_of_ex: bucket.days.len() as u32,
        })
        .collect()
}

/// A summary table with one row per period and a column group per type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    /// Types in column order
    pub types: Vec<String>,
    /// period -> type -> row
    pub cells: BTreeMap<String, BTreeMap<String, SummaryRow>>,
}

impl PivotTable {
    pub fn from_rows(rows: &[SummaryRow]) -> Self {
        let mut types = BTreeSet::new();
        let mut cells: BTreeMap<String, BTreeMap<String, SummaryRow>> = BTreeMap::new();
        for row in rows {
            types.insert(row.kind.clone());
            cells
                .entry(row.period.clone())
                .or_default()
                .insert(row.kind.clone(), row.clone());
        }
        Self {
            types: types.into_iter().collect(),
            cells,
        }
    }

    /// `period`, then `<type>.<metric>` for every type and metric.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["period".to_string()];
        for kind in &self.types {
            header.extend(PIVOT_METRICS.iter().map(|m| format!("{}.{}", kind, m)));
        }
        header
    }

    /// Write as CSV; types absent from a period are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.header())?;

        for (period, by_type) in &self.cells {
            let mut record = vec![period.clone()];
            for kind in &self.types {
                match by_type.get(kind) {
                    Some(row) => record.extend([
                        row.days_of_ex.to_string(),
                        format!("{:?}", row.duration),
                        row.number_of_ex.to_string(),
                    ]),
                    None => record.extend(
                        std::iter::repeat(String::new()).take(PIVOT_METRICS.len()),
                    ),
                }
            }
            out.write_record(&record)?;
        }

        out.flush()?;
        Ok(())
    }
}

/// The standard tables.
#[derive(Debug, Clone)]
pub struct SummaryTables {
    pub yearly: Vec<SummaryRow>,
    pub yearly_to_date: Vec<SummaryRow>,
    pub monthly: Vec<SummaryRow>,
    pub monthly_pivot: PivotTable,
}

impl SummaryTables {
    pub fn build(log: &ActivityLog, today: NaiveDate) -> Self {
        let sessions = prepare_sessions(log);
        let to_date = year_to_date(&sessions, today);
        let monthly = summary_table(&sessions, Period::Month);
        Self {
            yearly: summary_table(&sessions, Period::Year),
            yearly_to_date: summary_table(&to_date, Period::Year),
            monthly_pivot: PivotTable::from_rows(&monthly),
            monthly,
        }
    }

    /// (file stem, rows) pairs in output order; the pivot is written separately.
    pub fn named(&self) -> [(&'static str, &[SummaryRow]); 3] {
        [
            ("yearly_table", self.yearly.as_slice()),
            ("yearly_todate_table", self.yearly_to_date.as_slice()),
            ("monthly_table", self.monthly.as_slice()),
        ]
    }
}

/// Write serializable rows (summary or export) as CSV.
pub fn write_table_csv<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}
