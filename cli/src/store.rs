//! Session state persisted between CLI invocations.
//!
//! The file holds the session token and the workspace chosen before
//! signing in. Writes go through a temp file and a rename so an interrupted
//! save never leaves a truncated file behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tenancy::email::DomainSelection;

use crate::error::CliError;

const DEFAULT_DIR: &str = ".boardspace";
const DEFAULT_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub selected_domain: Option<DomainSelection>,
}

/// `$HOME/.boardspace/session.json`, or the working directory when `HOME` is unset.
#[must_use]
pub fn default_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(PathBuf::new, PathBuf::from)
        .join(DEFAULT_DIR)
        .join(DEFAULT_FILE)
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files.
    pub async fn load(&self) -> Result<StoredSession, CliError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredSession::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Directory creation or write failures.
    pub async fn save(&self, session: &StoredSession) -> Result<(), CliError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.part");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(session)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
