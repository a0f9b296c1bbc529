use std::sync::Arc;

use compact_str::{format_compact, CompactString};
use tracing::info;

use super::{resolve_project, ViewStatus};
use crate::{
    client::GitlabApi,
    domain::{Project, RegistryRepository, RegistryTag},
    id::RepositoryId,
};

/// Container registry browser: repositories of a project and the tags of the
/// selected repository
pub struct RegistryViewModel {
    api: Arc<GitlabApi>,
    project: Option<Project>,
    repositories: Vec<RegistryRepository>,
    selected: Option<RepositoryId>,
    tags: Vec<RegistryTag>,
    status: ViewStatus,
}

impl RegistryViewModel {
    pub fn new(api: Arc<GitlabApi>) -> Self {
        Self {
            api,
            project: None,
            repositories: Vec::new(),
            selected: None,
            tags: Vec::new(),
            status: ViewStatus::default(),
        }
    }

    pub async fn open_project(&mut self, input: &str) {
        self.repositories.clear();
        self.tags.clear();
        self.selected = None;
        self.project = resolve_project(&self.api, input, &mut self.status).await;
        let Some(project) = &self.project else {
            return;
        };

        match self.api.list_registry_repositories(project.id).await {
            Ok(repositories) => {
                self.repositories = repositories;
                self.status.loaded(format_compact!(
                    "{} registry repositories in {}",
                    self.repositories.len(),
                    project.path_with_namespace
                ));
            },
            Err(e) => self.status.client_failed("Loading registry repositories", &e),
        }
    }

    /// Selects a repository of the open project and loads its tags
    pub async fn select_repository(&mut self, repository_id: RepositoryId) {
        let Some(project) = &self.project else {
            self.status.failed("Open a project first");
            return;
        };
        if !self.repositories.iter().any(|r| r.id == repository_id) {
            self.status.failed(format_compact!("No registry repository {repository_id}"));
            return;
        }

        let project_id = project.id;
        self.selected = Some(repository_id);
        self.tags.clear();
        self.status.loading(format_compact!("Loading tags of repository {repository_id}"));

        match self.api.list_registry_tags(project_id, repository_id).await {
            Ok(tags) => {
                self.tags = tags;
                self.status.loaded(format_compact!("{} tags", self.tags.len()));
            },
            Err(e) => self.status.client_failed("Loading tags", &e),
        }
    }

    /// Deletes a tag of the selected repository, then reloads the tag list
    pub async fn delete_tag(&mut self, tag_name: &str) -> bool {
        let (Some(project), Some(repository_id)) = (&self.project, self.selected) else {
            self.status.failed("Select a registry repository first");
            return false;
        };
        let tag_name = tag_name.trim();
        if tag_name.is_empty() {
            self.status.failed("Enter a tag name");
            return false;
        }

        let project_id = project.id;
        match self.api.delete_registry_tag(project_id, repository_id, tag_name).await {
            Ok(()) => {
                info!(tag = tag_name, "Tag deleted, reloading");
                self.select_repository(repository_id).await;
                true
            },
            Err(e) => {
                self.status.client_failed(&format_compact!("Deleting tag '{tag_name}'"), &e);
                false
            },
        }
    }

    /// Descriptive text for a tag of the selected repository
    pub fn tag_logs(&self, tag_name: &str) -> Option<CompactString> {
        let project = self.project.as_ref()?;
        let repository_id = self.selected?;
        Some(self.api.registry_tag_logs(project.id, repository_id, tag_name))
    }

    pub fn repositories(&self) -> &[RegistryRepository] {
        &self.repositories
    }

    pub fn selected_repository(&self) -> Option<&RegistryRepository> {
        let selected = self.selected?;
        self.repositories.iter().find(|r| r.id == selected)
    }

    pub fn tags(&self) -> &[RegistryTag] {
        &self.tags
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, ResponseTemplate,
    };

    use super::*;
    use crate::{
        client::tests::{
            sample_project_json, sample_registry_repository_json, sample_registry_tags_json,
            MockServer,
        },
        viewmodel::LoadState,
    };

    async fn open_registry(mock_server: &MockServer) -> RegistryViewModel {
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fproject"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_project_json()))
            .mount(&mock_server.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/registry/repositories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([sample_registry_repository_json()])),
            )
            .mount(&mock_server.server)
            .await;

        let mut view_model = RegistryViewModel::new(mock_server.test_api());
        view_model.open_project("group/project").await;
        view_model
    }

    #[tokio::test]
    async fn test_browse_repositories_and_tags() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/registry/repositories/2/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_registry_tags_json()))
            .mount(&mock_server.server)
            .await;

        let mut view_model = open_registry(&mock_server).await;
        assert_eq!(view_model.repositories().len(), 1);

        view_model.select_repository(RepositoryId::new(2)).await;
        assert_eq!(view_model.status().state, LoadState::Loaded);
        assert_eq!(view_model.tags().len(), 2);
        assert_eq!(view_model.selected_repository().unwrap().tags_count, 2);

        let logs = view_model.tag_logs("latest").unwrap();
        assert!(logs.contains("'latest'"));
    }

    #[tokio::test]
    async fn test_unknown_repository_is_rejected() {
        let mock_server = MockServer::start().await;
        let mut view_model = open_registry(&mock_server).await;

        view_model.select_repository(RepositoryId::new(99)).await;
        assert!(view_model.status().is_error());
        assert!(view_model.tag_logs("latest").is_none());
    }

    #[tokio::test]
    async fn test_delete_tag_reloads_tags() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/registry/repositories/2/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_registry_tags_json()))
            .up_to_n_times(1)
            .mount(&mock_server.server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v4/projects/123/registry/repositories/2/tags/latest"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/registry/repositories/2/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                sample_registry_tags_json()[1].clone()
            ])))
            .mount(&mock_server.server)
            .await;

        let mut view_model = open_registry(&mock_server).await;
        view_model.select_repository(RepositoryId::new(2)).await;
        assert_eq!(view_model.tags().len(), 2);

        assert!(view_model.delete_tag("latest").await);
        assert_eq!(view_model.tags().len(), 1);
        assert_eq!(view_model.tags()[0].name, "v1.0.0");
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_tags() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/registry/repositories/2/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_registry_tags_json()))
            .mount(&mock_server.server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server.server)
            .await;

        let mut view_model = open_registry(&mock_server).await;
        view_model.select_repository(RepositoryId::new(2)).await;

        assert!(!view_model.delete_tag("latest").await);
        assert!(view_model.status().is_error());
        assert_eq!(view_model.tags().len(), 2);
    }
}
