use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use compact_str::{format_compact, CompactString};

use super::{resolve_project, Pager, ViewStatus};
use crate::{
    client::{CommitQuery, GitlabApi},
    domain::{Commit, Project},
};

/// Commit history of one project, paged, with an optional date window
pub struct CommitsViewModel {
    api: Arc<GitlabApi>,
    project: Option<Project>,
    commits: Vec<Commit>,
    pager: Pager,
    ref_name: Option<CompactString>,
    date_filter: bool,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    status: ViewStatus,
}

impl CommitsViewModel {
    pub fn new(api: Arc<GitlabApi>, per_page: u32) -> Self {
        let until = Utc::now();
        Self {
            api,
            project: None,
            commits: Vec::new(),
            pager: Pager::new(per_page),
            ref_name: None,
            date_filter: false,
            since: until - Duration::days(30),
            until,
            status: ViewStatus::default(),
        }
    }

    pub async fn open_project(&mut self, input: &str) {
        self.commits.clear();
        self.pager.reset();
        self.project = resolve_project(&self.api, input, &mut self.status).await;
        if self.project.is_some() {
            self.load().await;
        }
    }

    /// Sets the date window; it only applies while the date filter is on
    pub fn set_date_range(&mut self, since: DateTime<Utc>, until: DateTime<Utc>) {
        self.since = since;
        self.until = until;
    }

    pub fn set_date_filter(&mut self, enabled: bool) {
        self.date_filter = enabled;
    }

    pub fn set_ref_name(&mut self, ref_name: Option<&str>) {
        self.ref_name = ref_name.map(Into::into);
    }

    /// The query for the current page. Since and until are left out unless
    /// the date filter is enabled.
    pub fn query(&self) -> CommitQuery {
        CommitQuery {
            since: self.date_filter.then_some(self.since),
            until: self.date_filter.then_some(self.until),
            ref_name: self.ref_name.clone(),
            page: self.pager.page(),
            per_page: self.pager.per_page(),
        }
    }

    pub async fn load(&mut self) {
        let Some(project) = &self.project else {
            self.status.failed("Open a project first");
            return;
        };

        let project_id = project.id;
        let page = self.pager.page();
        self.status.loading(format_compact!("Loading commits, page {page}"));

        match self.api.list_commits(project_id, &self.query()).await {
            Ok(commits) => {
                self.pager.record(commits.len());
                self.commits = commits;
                self.status
                    .loaded(format_compact!("{} commits on page {page}", self.commits.len()));
            },
            Err(e) => {
                self.pager.record(0);
                self.commits.clear();
                self.status.client_failed("Loading commits", &e);
            },
        }
    }

    /// Loads `page` directly
    pub async fn go_to_page(&mut self, page: u32) {
        self.pager.set_page(page);
        self.load().await;
    }

    pub async fn next_page(&mut self) -> bool {
        let moved = self.project.is_some() && self.pager.next();
        if moved {
            self.load().await;
        }
        moved
    }

    pub async fn previous_page(&mut self) -> bool {
        let moved = self.project.is_some() && self.pager.previous();
        if moved {
            self.load().await;
        }
        moved
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
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
    use crate::client::tests::{sample_commit_json, sample_project_json, MockServer};

    async fn view_model_for(mock_server: &MockServer) -> CommitsViewModel {
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fproject"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_project_json()))
            .mount(&mock_server.server)
            .await;
        CommitsViewModel::new(mock_server.test_api(), 1)
    }

    #[test]
    fn test_date_range_only_sent_with_filter_on() {
        let api = std::sync::Arc::new(
            GitlabApi::new(crate::client::ClientConfig::new("https://gitlab.example.com", "t"))
                .unwrap(),
        );
        let mut view_model = CommitsViewModel::new(api, 20);
        let since = "2024-01-01T00:00:00Z".parse().unwrap();
        let until = "2024-02-01T00:00:00Z".parse().unwrap();
        view_model.set_date_range(since, until);

        let query = view_model.query();
        assert_eq!(query.since, None);
        assert_eq!(query.until, None);

        view_model.set_date_filter(true);
        let query = view_model.query();
        assert_eq!(query.since, Some(since));
        assert_eq!(query.until, Some(until));
    }

    #[tokio::test]
    async fn test_paging_through_commits() {
        let mock_server = MockServer::start().await;
        let mut view_model = view_model_for(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/commits"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([sample_commit_json()])))
            .mount(&mock_server.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/commits"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server.server)
            .await;

        view_model.open_project("group/project").await;
        assert_eq!(view_model.commits().len(), 1);
        assert!(view_model.pager().has_next_page());

        assert!(view_model.next_page().await);
        assert!(view_model.commits().is_empty());
        assert!(!view_model.pager().has_next_page());
        assert!(view_model.pager().has_previous_page());
    }

    #[tokio::test]
    async fn test_date_filter_reaches_the_request() {
        let mock_server = MockServer::start().await;
        let mut view_model = view_model_for(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/123/repository/commits"))
            .and(query_param("since", "2024-01-01T00:00:00+00:00"))
            .and(query_param("ref_name", "develop"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([sample_commit_json()])))
            .expect(1)
            .mount(&mock_server.server)
            .await;

        view_model.set_date_range(
            "2024-01-01T00:00:00Z".parse().unwrap(),
            "2024-02-01T00:00:00Z".parse().unwrap(),
        );
        view_model.set_date_filter(true);
        view_model.set_ref_name(Some("develop"));
        view_model.open_project("group/project").await;

        assert_eq!(view_model.commits().len(), 1);
    }
}
