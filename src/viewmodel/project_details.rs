use std::sync::Arc;

use compact_str::format_compact;

use super::{resolve_project, ViewStatus};
use crate::{
    client::{CommitQuery, GitlabApi},
    domain::{Commit, Issue, IssueState, Project},
};

const RECENT_COMMITS: u32 = 10;

/// One project with its open issues and latest commits
pub struct ProjectDetailsViewModel {
    api: Arc<GitlabApi>,
    project: Option<Project>,
    open_issues: Vec<Issue>,
    recent_commits: Vec<Commit>,
    status: ViewStatus,
}

impl ProjectDetailsViewModel {
    pub fn new(api: Arc<GitlabApi>) -> Self {
        Self {
            api,
            project: None,
            open_issues: Vec::new(),
            recent_commits: Vec::new(),
            status: ViewStatus::default(),
        }
    }

    /// Resolves `input` to a project, then fetches its open issues and recent
    /// commits concurrently. A failure of either list is reported while the
    /// other one is kept.
    pub async fn load(&mut self, input: &str) {
        self.open_issues.clear();
        self.recent_commits.clear();
        self.project = resolve_project(&self.api, input, &mut self.status).await;
        let Some(project) = &self.project else {
            return;
        };

        let commits = CommitQuery { per_page: RECENT_COMMITS, ..Default::default() };
        let (issues, commits) = tokio::join!(
            self.api.list_issues(project.id, IssueState::Opened),
            self.api.list_commits(project.id, &commits),
        );

        let mut failures = Vec::new();
        match issues {
            Ok(issues) => self.open_issues = issues,
            Err(e) => failures.push(format!("issues ({e})")),
        }
        match commits {
            Ok(commits) => self.recent_commits = commits,
            Err(e) => failures.push(format!("commits ({e})")),
        }

        if failures.is_empty() {
            self.status.loaded(format_compact!(
                "{}: {} open issues, {} recent commits",
                project.path_with_namespace,
                self.open_issues.len(),
                self.recent_commits.len()
            ));
        } else {
            self.status.failed(format_compact!("Could not load {}", failures.join(", ")));
        }
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn open_issues(&self) -> &[Issue] {
        &self.open_issues
    }

    pub fn recent_commits(&self) -> &[Commit] {
        &self.recent_commits
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }
}
