use compact_str::CompactString;
use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("No GitLab token saved. Run `tanuki token save <TOKEN>` first.")]
    MissingToken,
    #[error("Failure reading configuration file: {0}")]
    ConfigError(CompactString),
    #[error("Failed to initialize logging: {0}")]
    LoggingError(String),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    GeneralError(CompactString),
}
