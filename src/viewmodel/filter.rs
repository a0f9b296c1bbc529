//! Client-side narrowing and ordering of loaded pages.
//!
//! Sorting is stable, so re-applying the same filter and sort to an already
//! filtered list yields that list again.

use std::{cmp::Ordering, str::FromStr};

use itertools::Itertools;

use crate::domain::{Issue, Project};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectSort {
    #[default]
    LastActivity,
    Name,
    Stars,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueSort {
    #[default]
    Updated,
    Created,
    Title,
    Upvotes,
}

/// Case-insensitive substring match against any of `fields`; a blank term
/// matches everything
pub fn matches_text(term: &str, fields: &[&str]) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }

    let term = term.to_lowercase();
    fields.iter().any(|field| field.to_lowercase().contains(&term))
}

pub fn filter_projects<'a>(
    projects: impl IntoIterator<Item = &'a Project>,
    term: &str,
    sort: ProjectSort,
) -> Vec<&'a Project> {
    projects
        .into_iter()
        .filter(|p| {
            let fields = [p.name.as_str(), p.path_with_namespace.as_str(), p.description.as_str()];
            matches_text(term, &fields)
        })
        .sorted_by(|a, b| compare_projects(sort, a, b))
        .collect()
}

pub fn filter_issues<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    term: &str,
    sort: IssueSort,
) -> Vec<&'a Issue> {
    issues
        .into_iter()
        .filter(|i| matches_text(term, &[i.title.as_str(), i.description.as_str()]))
        .sorted_by(|a, b| compare_issues(sort, a, b))
        .collect()
}

fn compare_projects(sort: ProjectSort, a: &Project, b: &Project) -> Ordering {
    match sort {
        ProjectSort::LastActivity => b.last_activity_at.cmp(&a.last_activity_at),
        ProjectSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        ProjectSort::Stars => b.star_count.cmp(&a.star_count),
    }
}

fn compare_issues(sort: IssueSort, a: &Issue, b: &Issue) -> Ordering {
    match sort {
        IssueSort::Updated => b.updated_at.cmp(&a.updated_at),
        IssueSort::Created => b.created_at.cmp(&a.created_at),
        IssueSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        IssueSort::Upvotes => b.upvotes.cmp(&a.upvotes),
    }
}

impl FromStr for ProjectSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "activity" | "last_activity" => Ok(Self::LastActivity),
            "name" => Ok(Self::Name),
            "stars" => Ok(Self::Stars),
            other => Err(format!("unknown project sort: {other}")),
        }
    }
}

impl FromStr for IssueSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "updated" => Ok(Self::Updated),
            "created" => Ok(Self::Created),
            "title" => Ok(Self::Title),
            "upvotes" => Ok(Self::Upvotes),
            other => Err(format!("unknown issue sort: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn project(name: &str, stars: u32, day: u32) -> Project {
        Project {
            name: name.into(),
            path_with_namespace: format!("group/{name}").into(),
            star_count: stars,
            last_activity_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    fn names(projects: Vec<&Project>) -> Vec<&str> {
        projects.into_iter().map(|p| p.name.as_str()).collect()
    }

    fn issue(title: &str, upvotes: u32) -> Issue {
        Issue { title: title.into(), upvotes, ..Default::default() }
    }

    #[test]
    fn test_matches_text() {
        assert!(matches_text("", &["anything"]));
        assert!(matches_text("  ", &[]));
        assert!(matches_text("PIPE", &["", "ci pipeline"]));
        assert!(!matches_text("deploy", &["ci pipeline"]));
    }

    #[test]
    fn test_filter_projects_by_name_and_description() {
        let mut described = project("alpha", 0, 1);
        described.description = "Frontend app".into();
        let projects = vec![described, project("frontend-lib", 0, 2), project("backend", 0, 3)];

        assert_eq!(
            names(filter_projects(&projects, "frontend", ProjectSort::Name)),
            ["alpha", "frontend-lib"]
        );
    }

    #[test]
    fn test_project_sort_orders() {
        let projects = vec![project("b", 5, 1), project("a", 1, 3), project("c", 9, 2)];

        assert_eq!(
            names(filter_projects(&projects, "", ProjectSort::LastActivity)),
            ["a", "c", "b"]
        );
        assert_eq!(names(filter_projects(&projects, "", ProjectSort::Name)), ["a", "b", "c"]);
        assert_eq!(names(filter_projects(&projects, "", ProjectSort::Stars)), ["c", "b", "a"]);
    }

    #[test]
    fn test_filter_and_sort_are_idempotent() {
        let projects = vec![
            project("same", 1, 1),
            project("Same", 1, 1),
            project("other", 3, 2),
            project("samesies", 1, 4),
        ];

        let once = filter_projects(&projects, "same", ProjectSort::Stars);
        let twice = filter_projects(once.iter().copied(), "same", ProjectSort::Stars);
        assert_eq!(once, twice);

        let issues = vec![issue("b", 2), issue("a", 2), issue("c", 7)];
        let once = filter_issues(&issues, "", IssueSort::Upvotes);
        let twice = filter_issues(once.iter().copied(), "", IssueSort::Upvotes);
        assert_eq!(once, twice);
        // ties keep their incoming order
        assert_eq!(once.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(), ["c", "b", "a"]);
    }

    #[test]
    fn test_parse_sort_keys() {
        assert_eq!("Stars".parse::<ProjectSort>(), Ok(ProjectSort::Stars));
        assert_eq!("title".parse::<IssueSort>(), Ok(IssueSort::Title));
        assert!("size".parse::<IssueSort>().is_err());
    }
}
