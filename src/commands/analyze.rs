// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `analyze` command: print summary tables and save them, the monthly pivot
//! and the cleaned activity export next to the dataset.

use crate::error::Result;
use crate::services::analysis::{clean_export, write_table_csv};
use crate::services::SummaryTables;
use crate::store::ensure_dir;
use crate::time_utils::format_stamp;
use crate::AppState;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::Table;

pub fn handle(state: &AppState) -> Result<Vec<PathBuf>> {
    let (credentials, log) = super::load_state(state)?;
    let tables = SummaryTables::build(&log, Utc::now().date_naive());

    ensure_dir(&state.config.data_dir)?;
    let stamp = format_stamp(credentials.last_update);
    let mut written = Vec::new();

    for (stem, rows) in tables.named() {
        println!("{}", stem);
        if rows.is_empty() {
            println!("(no activities)\n");
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}\n", table);
        }

        let path = state.config.data_dir.join(format!("{}_{}.csv", stem, stamp));
        write_table_csv(rows, fs::File::create(&path)?)?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "Summary table written");
        written.push(path);
    }

    let path = state.config.data_dir.join(format!("monthly_table_pivot_{}.csv", stamp));
    tables.monthly_pivot.write_csv(fs::File::create(&path)?)?;
    tracing::debug!(path = %path.display(), types = tables.monthly_pivot.types.len(), "Pivot table written");
    written.push(path);

    let export = clean_export(&log);
    let path = state.config.data_dir.join(format!("excel_all_activities_{}.csv", stamp));
    write_table_csv(&export, fs::File::create(&path)?)?;
    tracing::debug!(path = %path.display(), rows = export.len(), "Activity export written");
    written.push(path);

    Ok(written)
}
