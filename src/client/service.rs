//! Failure-tolerant GitLab operations
//!
//! Wraps [`GitlabApi`] and turns every failure into the operation's empty
//! value after logging it: an empty list, `None`, `false`, or `"Unknown"` for
//! the current user's name.

use std::sync::Arc;

use compact_str::CompactString;
use tracing::{error, info, instrument};

use super::{
    api::GitlabApi,
    config::{ClientConfig, CommitQuery},
    error::{ClientError, Result},
};
use crate::{
    domain::{
        Commit, Issue, IssueState, Package, PackageFile, Project, RegistryRepository,
        RegistryTag,
    },
    id::{PackageId, ProjectId, RepositoryId},
};

/// Name reported when the current user cannot be fetched
pub const UNKNOWN_USER: &str = "Unknown";

/// High-level service for GitLab operations
#[derive(Debug, Clone)]
pub struct GitlabService {
    api: Arc<GitlabApi>,
}

impl GitlabService {
    /// Create a new GitLab service
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_api(Arc::new(GitlabApi::new(config)?)))
    }

    /// Create service from existing API client
    pub fn from_api(api: Arc<GitlabApi>) -> Self {
        Self { api }
    }

    pub async fn list_projects(&self, page: u32, per_page: u32) -> Vec<Project> {
        or_empty("list_projects", self.api.list_projects(page, per_page).await)
    }

    pub async fn search_projects(&self, search: &str, page: u32, per_page: u32) -> Vec<Project> {
        or_empty("search_projects", self.api.search_projects(search, page, per_page).await)
    }

    pub async fn get_project_by_path(&self, path: &str) -> Option<Project> {
        self.api
            .get_project_by_path(path)
            .await
            .map_err(|e| log_failure("get_project_by_path", &e))
            .ok()
    }

    pub async fn list_commits(&self, project_id: ProjectId, query: &CommitQuery) -> Vec<Commit> {
        or_empty("list_commits", self.api.list_commits(project_id, query).await)
    }

    pub async fn list_issues(&self, project_id: ProjectId, state: IssueState) -> Vec<Issue> {
        or_empty("list_issues", self.api.list_issues(project_id, state).await)
    }

    pub async fn search_issues(&self, search: &str) -> Vec<Issue> {
        or_empty("search_issues", self.api.search_issues(search).await)
    }

    pub async fn list_registry_repositories(
        &self,
        project_id: ProjectId,
    ) -> Vec<RegistryRepository> {
        or_empty(
            "list_registry_repositories",
            self.api.list_registry_repositories(project_id).await,
        )
    }

    pub async fn list_registry_tags(
        &self,
        project_id: ProjectId,
        repository_id: RepositoryId,
    ) -> Vec<RegistryTag> {
        or_empty(
            "list_registry_tags",
            self.api.list_registry_tags(project_id, repository_id).await,
        )
    }

    pub fn registry_tag_logs(
        &self,
        project_id: ProjectId,
        repository_id: RepositoryId,
        tag_name: &str,
    ) -> CompactString {
        self.api.registry_tag_logs(project_id, repository_id, tag_name)
    }

    pub async fn delete_registry_tag(
        &self,
        project_id: ProjectId,
        repository_id: RepositoryId,
        tag_name: &str,
    ) -> bool {
        self.api
            .delete_registry_tag(project_id, repository_id, tag_name)
            .await
            .map_err(|e| log_failure("delete_registry_tag", &e))
            .is_ok()
    }

    pub async fn list_packages(&self, project_id: ProjectId, page: u32, per_page: u32) -> Vec<Package> {
        or_empty("list_packages", self.api.list_packages(project_id, page, per_page).await)
    }

    pub async fn list_package_files(
        &self,
        project_id: ProjectId,
        package_id: PackageId,
    ) -> Vec<PackageFile> {
        or_empty(
            "list_package_files",
            self.api.list_package_files(project_id, package_id).await,
        )
    }

    /// True iff `GET /user` answers with a 2xx status
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> bool {
        match self.api.ping().await {
            Ok(()) => {
                info!("GitLab connection validation successful");
                true
            },
            Err(e) => {
                log_failure("test_connection", &e);
                false
            },
        }
    }

    /// Display name of the token's owner, or [`UNKNOWN_USER`]
    pub async fn get_current_user(&self) -> CompactString {
        self.api
            .current_user()
            .await
            .map(|user| user.name)
            .unwrap_or_else(|e| {
                log_failure("get_current_user", &e);
                UNKNOWN_USER.into()
            })
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        self.api.config()
    }

    /// Get reference to the underlying API client
    pub fn api(&self) -> &Arc<GitlabApi> {
        &self.api
    }
}

fn or_empty<T: Default>(operation: &'static str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        log_failure(operation, &e);
        T::default()
    })
}

fn log_failure(operation: &'static str, e: &ClientError) {
    match e.status() {
        Some(status) => error!(operation, status, error = %e, "GitLab request failed"),
        None => error!(operation, error = %e, "GitLab request failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ClientConfig {
        ClientConfig::new("https://gitlab.example.com", "test-token")
    }

    #[test]
    fn test_service_creation() {
        let service = GitlabService::new(test_config());
        assert!(service.is_ok());
    }

    #[test]
    fn test_service_creation_invalid_config() {
        let service = GitlabService::new(ClientConfig::new("", "test-token"));
        assert!(service.is_err());
    }

    #[test]
    fn test_config_access() {
        let config = test_config();
        let service = GitlabService::new(config.clone()).unwrap();

        assert_eq!(service.config().base_url, config.base_url);
        assert_eq!(service.config().private_token, config.private_token);
    }

    #[test]
    fn test_or_empty_returns_default_on_failure() {
        let projects: Vec<Project> = or_empty("test", Err(ClientError::Authentication));
        assert!(projects.is_empty());

        let count: u32 = or_empty("test", Ok(3));
        assert_eq!(count, 3);
    }
}
