use std::path::{Path, PathBuf};

use compact_str::{CompactString, ToCompactString};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::result::{PanelError, Result};

/// Application settings persisted with confy. The token is kept apart, in the
/// credential store.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    /// The URL of the GitLab instance
    pub gitlab_url: CompactString,
    /// Page size for paginated listings
    pub per_page: u32,
    /// Log level for the file logger; "Off" disables it
    pub log_level: Option<CompactString>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            gitlab_url: "https://gitlab.com".into(),
            per_page: 20,
            log_level: None,
        }
    }
}

impl PanelConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.gitlab_url.trim().is_empty() {
            return Err("gitlab_url is required".to_string());
        }
        if !(1..=100).contains(&self.per_page) {
            return Err("per_page must be between 1 and 100".to_string());
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("tanuki-panel.toml")
    } else {
        PathBuf::from("tanuki-panel.toml")
    }
}

/// Loads the config file, falling back to defaults when it does not exist yet
pub fn load_config(config_file: &Path) -> Result<PanelConfig> {
    let config: PanelConfig = if config_file.exists() {
        confy::load_path(config_file).map_err(|e| PanelError::ConfigError(e.to_compact_string()))?
    } else {
        PanelConfig::default()
    };

    config
        .validate()
        .map_err(|e| PanelError::ConfigError(e.into()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tanuki-panel.toml");
        std::fs::write(
            &path,
            "gitlab_url = \"https://gitlab.example.com\"\nper_page = 50\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let expected = PanelConfig {
            gitlab_url: "https://gitlab.example.com".into(),
            per_page: 50,
            log_level: Some("debug".into()),
        };
        assert_eq!(load_config(&path).unwrap(), expected);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tanuki-panel.toml");
        std::fs::write(&path, "per_page = 5\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gitlab_url, "https://gitlab.com");
        assert_eq!(config.per_page, 5);
    }

    #[test]
    fn test_invalid_page_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tanuki-panel.toml");
        std::fs::write(&path, "gitlab_url = \"https://gitlab.com\"\nper_page = 0\n").unwrap();

        assert!(matches!(load_config(&path), Err(PanelError::ConfigError(_))));
    }
}
