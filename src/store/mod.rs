// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flat-file persistence: `config.json` and the activity CSV files.

pub mod activities;
pub mod credentials;

pub use activities::ActivityStore;
pub use credentials::CredentialStore;

use std::path::Path;

/// File names inside the data directory.
pub mod files {
    pub const CONFIG: &str = "config.json";
    pub const ACTIVITIES_PREFIX: &str = "strava_activities_";
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write `contents` to `path` via a sibling temp file and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}
