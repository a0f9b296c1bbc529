//! Configuration management for GitLab client

use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use compact_str::{format_compact, CompactString};
use derive_builder::Builder;
use reqwest::Url;

use super::error::{ClientError, Result};
use crate::config::PanelConfig;

/// Main configuration for GitLab client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitLab instance base URL, without the `/api/v4` suffix
    pub base_url: CompactString,
    /// Private access token
    pub private_token: CompactString,
    /// Request configuration
    pub request: RequestConfig,
    /// Debug configuration
    pub debug: DebugConfig,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Number of items per page for paginated requests
    pub per_page: u32,
    /// Request timeout
    pub timeout: Duration,
}

/// Debug and logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Enable debug logging of HTTP responses
    pub log_responses: bool,
    /// Directory for storing debug logs
    pub log_directory: Option<PathBuf>,
}

/// Query parameters for the projects endpoint
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct ProjectQuery {
    /// Free-text search on name and path
    #[builder(setter(into, strip_option))]
    pub search: Option<CompactString>,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    /// Only projects the token's user is a member of
    pub membership: bool,
}

/// Query parameters for the repository commits endpoint
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct CommitQuery {
    #[builder(setter(strip_option))]
    pub since: Option<DateTime<Utc>>,
    #[builder(setter(strip_option))]
    pub until: Option<DateTime<Utc>>,
    /// Branch or tag; the default branch when absent
    #[builder(setter(into, strip_option))]
    pub ref_name: Option<CompactString>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { per_page: 20, timeout: Duration::from_secs(30) }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: Some(PathBuf::from("tanuki-logs")),
        }
    }
}

impl Default for ProjectQuery {
    fn default() -> Self {
        Self { search: None, page: 1, per_page: 20, membership: true }
    }
}

impl Default for CommitQuery {
    fn default() -> Self {
        Self { since: None, until: None, ref_name: None, page: 1, per_page: 20 }
    }
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(
        base_url: impl Into<CompactString>,
        private_token: impl Into<CompactString>,
    ) -> Self {
        let base_url: CompactString = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').into(),
            private_token: private_token.into(),
            request: RequestConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config("Base URL cannot be empty"));
        }

        if self.private_token.trim().is_empty() {
            return Err(ClientError::config("Private token cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config("Base URL must start with http:// or https://"));
        }

        if self.request.per_page == 0 || self.request.per_page > 100 {
            return Err(ClientError::config("per_page must be between 1 and 100"));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config("Timeout must be greater than zero"));
        }

        self.api_root().map(|_| ())
    }

    /// Root of the versioned REST API, `<base_url>/api/v4`
    pub fn api_root(&self) -> Result<Url> {
        let root = format_compact!("{}/api/v4", self.base_url);
        Url::parse(&root).map_err(|_| ClientError::invalid_url(root.as_str()))
    }

    /// Builds the client configuration from the application config file and
    /// the stored token.
    pub fn from_panel(config: &PanelConfig, private_token: impl Into<CompactString>) -> Self {
        let mut client_config = Self::new(config.gitlab_url.clone(), private_token);
        client_config.request.per_page = config.per_page;
        client_config
    }

    /// Enable debug logging
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }
}

impl ProjectQuery {
    /// The authenticated user's projects, one page of them
    pub fn page(page: u32, per_page: u32) -> Self {
        Self { page, per_page, ..Default::default() }
    }
}
