//! Error types for GitLab client operations

use compact_str::CompactString;
use thiserror::Error;

/// Structured error types for GitLab client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error with endpoint context
    #[error("Failed to parse JSON response from {endpoint}: {source}")]
    JsonParse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// GitLab API returned an error response
    #[error("GitLab API error (HTTP {status}): {message}")]
    GitlabApi { status: u16, message: CompactString },

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed
    #[error("Authentication failed")]
    Authentication,

    /// Token lacks the scope or role for the request
    #[error("Access denied: {resource}")]
    Forbidden { resource: String },

    /// Invalid URL format
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimit { retry_after: Option<std::time::Duration> },

    /// Local file error during a package transfer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create a JSON parsing error with endpoint context
    pub fn json_parse(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse { endpoint: endpoint.into(), source }
    }

    /// Create a GitLab API error
    pub fn gitlab_api(status: u16, message: impl Into<CompactString>) -> Self {
        Self::GitlabApi { status, message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn forbidden(resource: impl Into<String>) -> Self {
        Self::Forbidden { resource: resource.into() }
    }

    /// Create a rate limit error
    pub fn rate_limit(retry_after: Option<std::time::Duration>) -> Self {
        Self::RateLimit { retry_after }
    }

    /// HTTP status behind this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::GitlabApi { status, .. } => Some(*status),
            ClientError::Authentication => Some(401),
            ClientError::Forbidden { .. } => Some(403),
            ClientError::NotFound { .. } => Some(404),
            ClientError::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    /// Check if this error indicates a temporary network issue
    pub fn is_network_error(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
