//! GitLab client modules
//!
//! `api` speaks REST v4 and returns tagged results; `service` layers the
//! log-and-return-empty contract on top of it for callers that do not need to
//! tell a failure apart from an empty answer.

pub mod api;
pub mod config;
pub mod decode;
pub mod error;
pub mod service;
pub mod transfer;

#[cfg(test)]
pub(crate) mod tests;

// Re-export main types for convenience
pub use api::GitlabApi;
pub use config::{ClientConfig, CommitQuery, CommitQueryBuilder};
pub use error::ClientError;
pub use service::GitlabService;
pub use transfer::{CancelFlag, TransferOutcome};

pub type Result<T> = std::result::Result<T, ClientError>;
