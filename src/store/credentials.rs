// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `config.json` storage for [`Credentials`].

use super::{ensure_dir, files, write_atomic};
use crate::error::{AppError, Result};
use crate::models::Credentials;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads and rewrites the credential record as a whole.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store rooted at `data_dir/config.json`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(files::CONFIG),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether first-run setup has written a record yet.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and validate the record.
    ///
    /// A parse failure or a wrong field set is a [`AppError::ConfigFormat`].
    pub fn load(&self) -> Result<Credentials> {
        let json = fs::read_to_string(&self.path)?;
        serde_json::from_str(&json)
            .map_err(|e| AppError::ConfigFormat(format!("{}: {}", self.path.display(), e)))
    }

    /// Replace the record on disk.
    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(credentials)?;
        write_atomic(&self.path, json.as_bytes())?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "Credentials written");
        Ok(())
    }
}
