use std::sync::Arc;

use compact_str::{format_compact, CompactString};

use super::{
    filter::{filter_issues, IssueSort},
    resolve_project, ViewStatus,
};
use crate::{
    client::GitlabApi,
    domain::{Issue, IssueState, Project},
};

/// Issues of one project by state, or a search across all projects
pub struct IssuesViewModel {
    api: Arc<GitlabApi>,
    project: Option<Project>,
    state: IssueState,
    issues: Vec<Issue>,
    filter: CompactString,
    sort: IssueSort,
    status: ViewStatus,
}

impl IssuesViewModel {
    pub fn new(api: Arc<GitlabApi>) -> Self {
        Self {
            api,
            project: None,
            state: IssueState::Opened,
            issues: Vec::new(),
            filter: CompactString::default(),
            sort: IssueSort::default(),
            status: ViewStatus::default(),
        }
    }

    pub async fn open_project(&mut self, input: &str) {
        self.issues.clear();
        self.project = resolve_project(&self.api, input, &mut self.status).await;
        if self.project.is_some() {
            self.load().await;
        }
    }

    /// Reloads the open project's issues in `state`
    pub async fn set_state(&mut self, state: IssueState) {
        self.state = state;
        if self.project.is_some() {
            self.load().await;
        }
    }

    pub async fn load(&mut self) {
        let Some(project) = &self.project else {
            self.status.failed("Open a project first");
            return;
        };

        let project_id = project.id;
        let label =
            format_compact!("{} issues of {}", self.state.as_str(), project.path_with_namespace);
        self.status.loading(format_compact!("Loading {label}"));

        match self.api.list_issues(project_id, self.state).await {
            Ok(issues) => {
                self.issues = issues;
                self.status.loaded(format_compact!("{} {label}", self.issues.len()));
            },
            Err(e) => {
                self.issues.clear();
                self.status.client_failed(&format_compact!("Loading {label}"), &e);
            },
        }
    }

    /// Searches issues across every visible project. A blank term is
    /// rejected without a request.
    pub async fn search(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            self.status.failed("Enter a search term");
            return;
        }

        self.project = None;
        self.status.loading(format_compact!("Searching issues for '{term}'"));
        match self.api.search_issues(term).await {
            Ok(issues) => {
                self.issues = issues;
                self.status
                    .loaded(format_compact!("{} issues match '{term}'", self.issues.len()));
            },
            Err(e) => {
                self.issues.clear();
                self.status.client_failed("Searching issues", &e);
            },
        }
    }

    pub fn set_filter(&mut self, term: &str) {
        self.filter = term.trim().into();
    }

    pub fn set_sort(&mut self, sort: IssueSort) {
        self.sort = sort;
    }

    pub fn visible(&self) -> Vec<&Issue> {
        filter_issues(&self.issues, &self.filter, self.sort)
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn state(&self) -> IssueState {
        self.state
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }
}
