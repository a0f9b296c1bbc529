//! Screen state driven by the GitLab client
//!
//! Each view-model owns the results of its last load together with a
//! [`ViewStatus`]. Input validation happens here, before any request is made.

pub mod commits;
pub mod filter;
pub mod issues;
pub mod packages;
pub mod pager;
pub mod path;
pub mod project_details;
pub mod projects;
pub mod registry;
pub mod settings;

use compact_str::{CompactString, ToCompactString};
use tracing::debug;

pub use pager::Pager;
pub use path::normalize_project_path;

use crate::{
    client::{ClientError, GitlabApi},
    domain::Project,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Load state plus the message shown next to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStatus {
    pub state: LoadState,
    pub message: CompactString,
}

impl ViewStatus {
    pub fn loading(&mut self, message: impl Into<CompactString>) {
        self.state = LoadState::Loading;
        self.message = message.into();
    }

    pub fn loaded(&mut self, message: impl Into<CompactString>) {
        self.state = LoadState::Loaded;
        self.message = message.into();
    }

    pub fn failed(&mut self, message: impl Into<CompactString>) {
        self.state = LoadState::Error;
        self.message = message.into();
        debug!(message = %self.message, "View entered error state");
    }

    pub fn client_failed(&mut self, action: &str, error: &ClientError) {
        self.failed(describe_failure(action, error));
    }

    pub fn is_error(&self) -> bool {
        self.state == LoadState::Error
    }
}

fn describe_failure(action: &str, error: &ClientError) -> CompactString {
    match error {
        ClientError::Authentication => {
            compact_str::format_compact!("{action} failed: the token was rejected")
        },
        ClientError::NotFound { .. } => compact_str::format_compact!("{action} failed: not found"),
        e if e.is_network_error() => {
            compact_str::format_compact!("{action} failed: GitLab is unreachable")
        },
        e => compact_str::format_compact!("{action} failed: {}", e.to_compact_string()),
    }
}

/// Normalizes `input` and looks the project up. Both an invalid path and a
/// failed lookup are reported through `status`.
pub(crate) async fn resolve_project(
    api: &GitlabApi,
    input: &str,
    status: &mut ViewStatus,
) -> Option<Project> {
    let Some(path) = normalize_project_path(input) else {
        status.failed("Enter a project path such as group/project");
        return None;
    };

    status.loading(compact_str::format_compact!("Opening {path}"));
    match api.get_project_by_path(&path).await {
        Ok(project) => Some(project),
        Err(e) => {
            status.client_failed(&compact_str::format_compact!("Opening {path}"), &e);
            None
        },
    }
}
