use std::sync::Arc;

use compact_str::{format_compact, CompactString};
use tracing::info;

use super::{
    filter::{filter_projects, ProjectSort},
    Pager, ViewStatus,
};
use crate::{client::GitlabApi, domain::Project};

/// Paged list of the user's projects, optionally narrowed by a server-side search
pub struct ProjectsViewModel {
    api: Arc<GitlabApi>,
    projects: Vec<Project>,
    pager: Pager,
    search: Option<CompactString>,
    filter: CompactString,
    sort: ProjectSort,
    status: ViewStatus,
}

impl ProjectsViewModel {
    pub fn new(api: Arc<GitlabApi>, per_page: u32) -> Self {
        Self {
            api,
            projects: Vec::new(),
            pager: Pager::new(per_page),
            search: None,
            filter: CompactString::default(),
            sort: ProjectSort::default(),
            status: ViewStatus::default(),
        }
    }

    /// (Re)loads the current page
    pub async fn load(&mut self) {
        let (page, per_page) = (self.pager.page(), self.pager.per_page());
        self.status.loading(format_compact!("Loading projects, page {page}"));

        let result = match &self.search {
            Some(term) => self.api.search_projects(term, page, per_page).await,
            None => self.api.list_projects(page, per_page).await,
        };

        match result {
            Ok(projects) => {
                self.pager.record(projects.len());
                self.projects = projects;
                self.status.loaded(format_compact!(
                    "{} projects on page {page}",
                    self.projects.len()
                ));
            },
            Err(e) => {
                self.pager.record(0);
                self.projects.clear();
                self.status.client_failed("Loading projects", &e);
            },
        }
    }

    /// Loads `page` directly
    pub async fn go_to_page(&mut self, page: u32) {
        self.pager.set_page(page);
        self.load().await;
    }

    pub async fn next_page(&mut self) -> bool {
        let moved = self.pager.next();
        if moved {
            self.load().await;
        }
        moved
    }

    pub async fn previous_page(&mut self) -> bool {
        let moved = self.pager.previous();
        if moved {
            self.load().await;
        }
        moved
    }

    /// Starts a server-side search from the first page. A blank term is
    /// rejected without a request.
    pub async fn search(&mut self, term: &str) {
        self.search_page(term, 1).await;
    }

    /// Like [`Self::search`], loading `page` of the results directly
    pub async fn search_page(&mut self, term: &str, page: u32) {
        let term = term.trim();
        if term.is_empty() {
            self.status.failed("Enter a search term");
            return;
        }

        info!(term, page, "Searching projects");
        self.search = Some(term.into());
        self.pager.set_page(page);
        self.load().await;
    }

    pub async fn clear_search(&mut self) {
        self.search = None;
        self.pager.reset();
        self.load().await;
    }

    pub fn set_filter(&mut self, term: &str) {
        self.filter = term.trim().into();
    }

    pub fn set_sort(&mut self, sort: ProjectSort) {
        self.sort = sort;
    }

    /// The loaded page after the client-side filter and sort
    pub fn visible(&self) -> Vec<&Project> {
        filter_projects(&self.projects, &self.filter, self.sort)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, ResponseTemplate,
    };

    use super::*;
    use crate::{
        client::tests::{sample_project_json, MockServer},
        viewmodel::LoadState,
    };

    fn projects_page(count: usize) -> serde_json::Value {
        let projects: Vec<_> = (0..count)
            .map(|i| {
                let mut project = sample_project_json();
                project["id"] = json!(i + 1);
                project["name"] = json!(format!("project-{i}"));
                project
            })
            .collect();
        json!(projects)
    }

    #[tokio::test]
    async fn test_full_page_enables_next_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(projects_page(2)))
            .mount(&mock_server.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(projects_page(1)))
            .mount(&mock_server.server)
            .await;

        let mut view_model = ProjectsViewModel::new(mock_server.test_api(), 2);
        view_model.load().await;
        assert_eq!(view_model.projects().len(), 2);
        assert!(view_model.pager().has_next_page());

        assert!(view_model.next_page().await);
        assert_eq!(view_model.pager().page(), 2);
        assert_eq!(view_model.projects().len(), 1);
        assert!(!view_model.pager().has_next_page());
        assert!(!view_model.next_page().await);

        assert!(view_model.previous_page().await);
        assert_eq!(view_model.pager().page(), 1);
    }

    #[tokio::test]
    async fn test_search_resets_to_first_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("search", "tanuki"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(projects_page(1)))
            .expect(1)
            .mount(&mock_server.server)
            .await;

        let mut view_model = ProjectsViewModel::new(mock_server.test_api(), 20);
        view_model.search("  tanuki ").await;

        assert_eq!(view_model.search_term(), Some("tanuki"));
        assert_eq!(view_model.status().state, LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_search_at_page_is_a_single_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("search", "tanuki"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(projects_page(1)))
            .expect(1)
            .mount(&mock_server.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(projects_page(2)))
            .expect(0)
            .mount(&mock_server.server)
            .await;

        let mut view_model = ProjectsViewModel::new(mock_server.test_api(), 2);
        view_model.search_page("tanuki", 3).await;

        assert_eq!(view_model.pager().page(), 3);
        assert_eq!(view_model.projects().len(), 1);
        assert!(view_model.pager().has_previous_page());
    }

    #[tokio::test]
    async fn test_blank_search_is_a_validation_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&mock_server.server)
            .await;

        let mut view_model = ProjectsViewModel::new(mock_server.test_api(), 20);
        view_model.search("   ").await;

        assert!(view_model.status().is_error());
        assert_eq!(view_model.search_term(), None);
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_hidden() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server.server)
            .await;

        let mut view_model = ProjectsViewModel::new(mock_server.test_api(), 20);
        view_model.load().await;

        assert!(view_model.status().is_error());
        assert!(view_model.status().message.contains("token"));
        assert!(view_model.projects().is_empty());
    }

    #[tokio::test]
    async fn test_filter_applies_to_loaded_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(projects_page(3)))
            .mount(&mock_server.server)
            .await;

        let mut view_model = ProjectsViewModel::new(mock_server.test_api(), 20);
        view_model.load().await;
        view_model.set_filter("PROJECT-1");
        view_model.set_sort(ProjectSort::Name);

        let visible = view_model.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "project-1");
    }
}
