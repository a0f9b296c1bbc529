//! Local storage of the personal access token
//!
//! The token lives in a small JSON file, `{"ApiKey": ..., "SavedAtUtc": ...}`.
//! When the app runs from inside a git checkout the file sits under the
//! checkout's root, otherwise in the per-user data directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const CREDENTIALS_FILE: &str = "credentials.json";
const REPOSITORY_DIR: &str = ".tanuki";
const VCS_MARKER: &str = ".git";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "ApiKey")]
    pub token: CompactString,
    #[serde(rename = "SavedAtUtc")]
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the store location: the enclosing git checkout first (searched
    /// from the working directory, then from the executable's directory), the
    /// per-user data directory otherwise.
    pub fn discover() -> Self {
        let starts = [
            std::env::current_dir().ok(),
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
        ];

        let path = starts
            .iter()
            .flatten()
            .find_map(|start| find_repository_root(start))
            .map(|root| root.join(REPOSITORY_DIR).join(CREDENTIALS_FILE))
            .unwrap_or_else(user_data_path);

        debug!(path = %path.display(), "Resolved credential store");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists `token` with the current time. Blank tokens are rejected
    /// without touching the file; I/O failures are logged and reported as
    /// `false`.
    pub fn save(&self, token: &str) -> bool {
        if token.trim().is_empty() {
            warn!("Refusing to save an empty token");
            return false;
        }

        let credential = Credential { token: token.into(), saved_at: Utc::now() };
        match self.write(&credential) {
            Ok(()) => {
                info!(path = %self.path.display(), "Saved token");
                true
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to save token");
                false
            },
        }
    }

    /// The stored credential; `None` when the file is missing or unreadable
    pub fn load(&self) -> Option<Credential> {
        if !self.path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| warn!(path = %self.path.display(), error = %e, "Failed to read token file"))
            .ok()?;

        serde_json::from_str(&content)
            .map_err(|e| warn!(path = %self.path.display(), error = %e, "Failed to parse token file"))
            .ok()
    }

    fn write(&self, credential: &Credential) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, content)
    }
}

/// First ancestor of `start` (inclusive) that contains a `.git` entry
pub fn find_repository_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(VCS_MARKER).exists())
        .map(Path::to_path_buf)
}

fn user_data_path() -> PathBuf {
    ProjectDirs::from("", "", "tanuki-panel")
        .map(|dirs| dirs.data_dir().join(CREDENTIALS_FILE))
        .unwrap_or_else(|| PathBuf::from("tanuki-credentials.json"))
}
