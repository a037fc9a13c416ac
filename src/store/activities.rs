// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV storage for the local [`ActivityLog`].
//!
//! One row per activity, `id` first and the remaining columns sorted.
//! Cells are written so that reading a file and writing it again yields
//! the same bytes:
//! - missing/null attributes are empty cells and read back as null, so
//!   every column survives a rewrite
//! - numbers, booleans, arrays and objects are written as compact JSON
//!   and only parsed back when re-encoding reproduces the cell exactly
//! - everything else is a plain string
//!
//! CSV cells carry no type, so a string that reads as a JSON scalar comes
//! back typed: `"12345"` as a number, `"true"` as a bool, `""` as null.
//! The file bytes do not change; only the in-memory value type does.

use super::{ensure_dir, files, write_atomic};
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityLog, Credentials};
use crate::time_utils::format_stamp;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Dataset files, one per `last_update` stamp.
#[derive(Debug, Clone)]
pub struct ActivityStore {
    data_dir: PathBuf,
}

impl ActivityStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Path of the dataset written for the given credentials' `last_update`.
    pub fn path_for(&self, credentials: &Credentials) -> PathBuf {
        self.data_dir.join(format!(
            "{}{}.csv",
            files::ACTIVITIES_PREFIX,
            format_stamp(credentials.last_update)
        ))
    }

    /// Load the dataset matching `credentials.last_update`.
    ///
    /// Before the first sync there is no file yet and the dataset is empty.
    pub fn load(&self, credentials: &Credentials) -> Result<ActivityLog> {
        let path = self.path_for(credentials);
        if credentials.first_run && !path.exists() {
            return Ok(ActivityLog::new());
        }
        let file = fs::File::open(&path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Dataset file missing");
            e
        })?;
        read_csv(file)
    }

    /// Write the dataset under the stamp in `credentials.last_update`.
    pub fn save(&self, credentials: &Credentials, log: &ActivityLog) -> Result<PathBuf> {
        ensure_dir(&self.data_dir)?;
        let path = self.path_for(credentials);

        let mut buffer = Vec::new();
        write_csv(log, &mut buffer)?;
        write_atomic(&path, &buffer)?;

        tracing::info!(path = %path.display(), activities = log.len(), "Dataset written");
        Ok(path)
    }
}

/// Serialize the dataset as CSV.
pub fn write_csv<W: Write>(log: &ActivityLog, writer: W) -> Result<()> {
    let columns = log.attribute_columns();
    let mut out = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("id");
    header.extend(columns.iter().map(String::as_str));
    out.write_record(&header)?;

    for activity in log.iter() {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(activity.id.to_string());
        row.extend(
            columns
                .iter()
                .map(|c| activity.attributes.get(c).map(encode_cell).unwrap_or_default()),
        );
        out.write_record(&row)?;
    }

    out.flush()?;
    Ok(())
}

/// Parse a dataset previously written by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<ActivityLog> {
    let mut input = csv::Reader::from_reader(reader);
    let headers = input.headers()?.clone();
    let id_index = headers
        .iter()
        .position(|h| h == "id")
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Dataset has no id column")))?;

    let mut log = ActivityLog::new();
    for (line, record) in input.records().enumerate() {
        let record = record?;
        let raw_id = record.get(id_index).unwrap_or_default();
        let id: u64 = raw_id.parse().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "Dataset row {}: invalid id {:?}",
                line + 1,
                raw_id
            ))
        })?;

        let attributes: BTreeMap<String, Value> = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != id_index)
            .map(|(_, (column, cell))| (column.to_string(), decode_cell(cell)))
            .collect();

        if !log.insert(Activity { id, attributes }) {
            tracing::warn!(id, "Duplicate id in dataset file, keeping first row");
        }
    }
    Ok(log)
}

fn encode_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Value>(cell) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Array(_) | Value::Object(_)))
            if value.to_string() == cell =>
        {
            value
        }
        _ => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_log() -> ActivityLog {
        [
            json!({
                "id": 11,
                "name": "Lunch Run, easy",
                "type": "Run",
                "distance": 5012.3,
                "moving_time": 1800,
                "has_heartrate": true,
                "map": { "id": "a11", "summary_polyline": "abc\"def" },
                "start_latlng": [37.1, -122.2]
            }),
            json!({
                "id": 10,
                "name": "Pool",
                "type": "Swim",
                "distance": 1500.0,
                "average_watts": null,
                "external_id": "12345"
            }),
        ]
        .into_iter()
        .map(|v| Activity::from_json(v).unwrap())
        .collect()
    }

    fn to_string(log: &ActivityLog) -> String {
        let mut buffer = Vec::new();
        write_csv(log, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_header_has_id_first() {
        let csv_text = to_string(&sample_log());
        let header = csv_text.lines().next().unwrap();
        assert!(header.starts_with("id,"));
        assert!(header.contains("map.summary_polyline"));
    }

    #[test]
    fn test_rows_are_id_descending() {
        let csv_text = to_string(&sample_log());
        let ids: Vec<&str> = csv_text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["11", "10"]);
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let first = to_string(&sample_log());
        let reread = read_csv(first.as_bytes()).unwrap();
        let second = to_string(&reread);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_keeps_typed_values() {
        let log = read_csv(to_string(&sample_log()).as_bytes()).unwrap();
        let run = log.get(11).unwrap();
        assert_eq!(run.attributes["moving_time"], json!(1800));
        assert_eq!(run.attributes["has_heartrate"], json!(true));
        assert_eq!(run.attributes["start_latlng"], json!([37.1, -122.2]));
        assert_eq!(run.attributes["name"], json!("Lunch Run, easy"));
    }

    #[test]
    fn test_decode_cell_keeps_non_canonical_numbers_as_text() {
        assert_eq!(decode_cell("1e5"), json!("1e5"));
        assert_eq!(decode_cell("007"), json!("007"));
        assert_eq!(decode_cell("1500.0"), json!(1500.0));
    }

    #[test]
    fn test_scalar_like_strings_reload_typed() {
        let log: ActivityLog = [json!({
            "id": 1,
            "external_id": "12345",
            "name": "true",
            "description": ""
        })]
        .into_iter()
        .map(|v| Activity::from_json(v).unwrap())
        .collect();

        let text = to_string(&log);
        let reloaded = read_csv(text.as_bytes()).unwrap();
        let activity = reloaded.get(1).unwrap();
        assert_eq!(activity.attributes["external_id"], json!(12345));
        assert_eq!(activity.attributes["name"], json!(true));
        assert_eq!(activity.attributes["description"], Value::Null);
        assert_eq!(to_string(&reloaded), text);
    }

    #[test]
    fn test_read_rejects_missing_id_column() {
        let err = read_csv("name,type\nfoo,Run\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_store_load_first_run_without_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ActivityStore::new(dir.path());
        let creds = Credentials::first_run("1".into(), "2".into(), "3".into());

        assert!(store.load(&creds).unwrap().is_empty());
    }

    #[test]
    fn test_store_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = ActivityStore::new(dir.path());
        let mut creds = Credentials::first_run("1".into(), "2".into(), "3".into());
        creds.first_run = false;

        let path = store.save(&creds, &sample_log()).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("strava_activities_2022_01_01_1200"));

        let loaded = store.load(&creds).unwrap();
        assert_eq!(loaded.ids(), vec![11, 10]);
    }

    #[test]
    fn test_store_load_missing_file_after_first_run_fails() {
        let dir = TempDir::new().unwrap();
        let store = ActivityStore::new(dir.path());
        let mut creds = Credentials::first_run("1".into(), "2".into(), "3".into());
        creds.first_run = false;

        assert!(matches!(store.load(&creds), Err(AppError::Io(_))));
    }
}
