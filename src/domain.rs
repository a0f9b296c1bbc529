// GitLab API Documentation: https://docs.gitlab.com/ee/api/api_resources.html
//
// Every record is `#[serde(default)]`: fields missing from a payload take their
// zero value instead of failing the decode. See `client::decode` for how keys
// are matched.
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Deserialize;

use crate::id::{IssueId, PackageFileId, PackageId, ProjectId, RepositoryId, UserId};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: ProjectId,
    pub name: CompactString,
    pub description: CompactString,
    pub visibility: Visibility,
    pub web_url: CompactString,
    pub star_count: u32,
    pub forks_count: u32,
    pub open_issues_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub archived: bool,
    pub default_branch: CompactString,
    pub path_with_namespace: CompactString,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub id: IssueId,
    /// Project-scoped number, as shown in the web UI (`#42`)
    pub iid: u64,
    pub title: CompactString,
    pub description: CompactString,
    pub state: IssueState,
    pub web_url: CompactString,
    pub author: Option<User>,
    pub assignee: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub weight: Option<u32>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub labels: Vec<CompactString>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Commit {
    pub id: CompactString,
    pub short_id: CompactString,
    pub title: CompactString,
    pub message: CompactString,
    pub author_name: CompactString,
    pub author_email: CompactString,
    pub created_at: DateTime<Utc>,
    pub parent_ids: Vec<CompactString>,
    pub web_url: CompactString,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryRepository {
    pub id: RepositoryId,
    pub name: CompactString,
    pub path: CompactString,
    pub project_id: ProjectId,
    pub location: CompactString,
    pub created_at: DateTime<Utc>,
    pub tags_count: u32,
    pub delete_api_path: CompactString,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryTag {
    pub name: CompactString,
    pub path: CompactString,
    pub location: CompactString,
    pub digest: CompactString,
    pub revision: CompactString,
    pub short_revision: CompactString,
    pub created_at: DateTime<Utc>,
    pub total_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Package {
    pub id: PackageId,
    pub name: CompactString,
    pub version: CompactString,
    pub package_type: CompactString,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project_id: ProjectId,
    pub message: Option<CompactString>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PackageFile {
    pub id: PackageFileId,
    pub package_id: PackageId,
    pub file_name: CompactString,
    pub size: u64,
    pub file_sha256: CompactString,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub username: CompactString,
    pub name: CompactString,
    pub avatar_url: CompactString,
    pub web_url: CompactString,
    pub email: Option<CompactString>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Internal,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    #[default]
    Opened,
    Closed,
    Locked,
    All,
    #[serde(other)]
    Unknown,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Unknown => "unknown",
        }
    }
}

impl IssueState {
    /// Value of the `state` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Opened => "opened",
            IssueState::Closed => "closed",
            IssueState::Locked => "locked",
            IssueState::All | IssueState::Unknown => "all",
        }
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opened" | "open" => Ok(IssueState::Opened),
            "closed" => Ok(IssueState::Closed),
            "locked" => Ok(IssueState::Locked),
            "all" => Ok(IssueState::All),
            other => Err(format!("unknown issue state '{other}'")),
        }
    }
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Opened
    }

    pub fn author_name(&self) -> &str {
        self.author.as_ref().map_or("", |u| u.name.as_str())
    }
}
