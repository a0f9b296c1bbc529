//! Core HTTP client for GitLab API
//!
//! Every operation returns a tagged [`Result`]; callers that only want the
//! "empty on failure" behavior go through [`super::GitlabService`].

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::Local;
use compact_str::{format_compact, CompactString};
use reqwest::{header::RETRY_AFTER, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use super::{
    config::{ClientConfig, CommitQuery, ProjectQuery, ProjectQueryBuilder},
    decode,
    error::{ClientError, Result},
    transfer::{CancelFlag, TransferOutcome},
};
use crate::{
    domain::{
        Commit, Issue, IssueState, Package, PackageFile, Project, RegistryRepository,
        RegistryTag, User,
    },
    id::{PackageId, ProjectId, RepositoryId},
};

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Issue listings are fetched in one large page and filtered locally
const ISSUES_PER_PAGE: u32 = 100;

/// Pure HTTP client for GitLab API
#[derive(Debug, Clone)]
pub struct GitlabApi {
    client: Client,
    config: ClientConfig,
    api_root: Url,
}

/// GitLab API error response formats
#[derive(Debug, Deserialize)]
struct GitlabApiError {
    error: CompactString,
    error_description: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
struct GitlabApiError2 {
    message: serde_json::Value,
}

impl GitlabApi {
    /// Create a new GitLab API client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let api_root = config.api_root()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, config, api_root })
    }

    /// Projects the authenticated user is a member of, most recently active first
    pub async fn list_projects(&self, page: u32, per_page: u32) -> Result<Vec<Project>> {
        self.get_projects(&ProjectQuery::page(page, per_page)).await
    }

    /// Same as [`Self::list_projects`], narrowed by a free-text search
    pub async fn search_projects(
        &self,
        search: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Project>> {
        let query = ProjectQueryBuilder::default()
            .search(search)
            .page(page)
            .per_page(per_page)
            .build()
            .map_err(|e| ClientError::config(e.to_string()))?;

        self.get_projects(&query).await
    }

    #[instrument(skip(self), fields(page = query.page, per_page = query.per_page))]
    pub async fn get_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>> {
        let url = self.build_projects_url(query)?;
        let projects: Vec<Project> = self.get_json(url).await?;
        debug!(project_count = projects.len(), "Fetched projects");
        Ok(projects)
    }

    /// Resolves a project by its namespaced path instead of its numeric id
    #[instrument(skip(self))]
    pub async fn get_project_by_path(&self, path: &str) -> Result<Project> {
        let url = self.build_project_by_path_url(path)?;
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(project_id = %project_id, page = query.page))]
    pub async fn list_commits(
        &self,
        project_id: ProjectId,
        query: &CommitQuery,
    ) -> Result<Vec<Commit>> {
        let url = self.build_commits_url(project_id, query)?;
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(project_id = %project_id, state = state.as_str()))]
    pub async fn list_issues(&self, project_id: ProjectId, state: IssueState) -> Result<Vec<Issue>> {
        let url = self.build_issues_url(project_id, state)?;
        self.get_json(url).await
    }

    /// Searches issues across every project visible to the token
    #[instrument(skip(self))]
    pub async fn search_issues(&self, search: &str) -> Result<Vec<Issue>> {
        let url = self.build_search_issues_url(search)?;
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(project_id = %project_id))]
    pub async fn list_registry_repositories(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<RegistryRepository>> {
        let id = project_id.to_string();
        let mut url = self.endpoint(["projects", id.as_str(), "registry", "repositories"])?;
        url.query_pairs_mut().append_pair("tags_count", "true");
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(project_id = %project_id, repository_id = %repository_id))]
    pub async fn list_registry_tags(
        &self,
        project_id: ProjectId,
        repository_id: RepositoryId,
    ) -> Result<Vec<RegistryTag>> {
        let url = self.build_registry_tags_url(project_id, repository_id, None)?;
        self.get_json(url).await
    }

    /// Describes a registry tag. The registry API exposes no container logs,
    /// so this never performs a request.
    pub fn registry_tag_logs(
        &self,
        project_id: ProjectId,
        repository_id: RepositoryId,
        tag_name: &str,
    ) -> CompactString {
        format_compact!(
            "No logs are available for tag '{tag_name}' (project {project_id}, repository {repository_id}).\n\
             The container registry stores image layers only; run the image locally to inspect its output."
        )
    }

    #[instrument(skip(self), fields(project_id = %project_id, repository_id = %repository_id))]
    pub async fn delete_registry_tag(
        &self,
        project_id: ProjectId,
        repository_id: RepositoryId,
        tag_name: &str,
    ) -> Result<()> {
        let url = self.build_registry_tags_url(project_id, repository_id, Some(tag_name))?;
        let response = self.authenticated_request(Method::DELETE, url).send().await?;
        self.handle_empty_response(response).await?;

        info!(tag = tag_name, "Deleted registry tag");
        Ok(())
    }

    #[instrument(skip(self), fields(project_id = %project_id, page = page))]
    pub async fn list_packages(
        &self,
        project_id: ProjectId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Package>> {
        let id = project_id.to_string();
        let mut url = self.endpoint(["projects", id.as_str(), "packages"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());

        self.get_json(url).await
    }

    #[instrument(skip(self), fields(project_id = %project_id, package_id = %package_id))]
    pub async fn list_package_files(
        &self,
        project_id: ProjectId,
        package_id: PackageId,
    ) -> Result<Vec<PackageFile>> {
        let id = project_id.to_string();
        let package = package_id.to_string();
        let url =
            self.endpoint(["projects", id.as_str(), "packages", package.as_str(), "package_files"])?;
        self.get_json(url).await
    }

    /// Streams a generic package file to `destination`. The cancel flag is
    /// checked before the request and between chunks. Bytes are staged in a
    /// sibling `.part` file that replaces `destination` only once the body is
    /// complete, so a failed or cancelled download leaves an existing file
    /// untouched.
    #[instrument(skip(self, destination, cancel), fields(project_id = %project_id))]
    pub async fn download_generic_package_file(
        &self,
        project_id: ProjectId,
        package: &Package,
        file_name: &str,
        destination: &Path,
        cancel: &CancelFlag,
    ) -> Result<TransferOutcome> {
        if cancel.is_cancelled() {
            return Ok(TransferOutcome::Cancelled);
        }

        let url = self.build_generic_package_url(
            project_id,
            &package.name,
            &package.version,
            file_name,
        )?;
        let mut response = self.authenticated_request(Method::GET, url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(destination);
        let outcome = match stream_to_file(&mut response, &partial, cancel).await {
            Ok(TransferOutcome::Completed { bytes }) => {
                match tokio::fs::rename(&partial, destination).await {
                    Ok(()) => TransferOutcome::Completed { bytes },
                    Err(e) => {
                        remove_partial(&partial).await;
                        return Err(e.into());
                    },
                }
            },
            Ok(TransferOutcome::Cancelled) => {
                remove_partial(&partial).await;
                info!("Download cancelled");
                return Ok(TransferOutcome::Cancelled);
            },
            Err(e) => {
                remove_partial(&partial).await;
                warn!(error = %e, "Download failed");
                return Err(e);
            },
        };

        info!(?outcome, destination = %destination.display(), "Downloaded package file");
        Ok(outcome)
    }

    /// Uploads `source` as a file of a generic package. The cancel flag is
    /// checked before the file is read and again before the body is sent.
    #[instrument(skip(self, source, cancel), fields(project_id = %project_id))]
    pub async fn upload_generic_package_file(
        &self,
        project_id: ProjectId,
        package_name: &str,
        package_version: &str,
        source: &Path,
        cancel: &CancelFlag,
    ) -> Result<TransferOutcome> {
        if cancel.is_cancelled() {
            return Ok(TransferOutcome::Cancelled);
        }

        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                std::io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("not a file path: {}", source.display()),
                )
            })?;

        let body = tokio::fs::read(source).await?;
        if cancel.is_cancelled() {
            return Ok(TransferOutcome::Cancelled);
        }

        let bytes = body.len() as u64;
        let url =
            self.build_generic_package_url(project_id, package_name, package_version, file_name)?;
        let response = self
            .authenticated_request(Method::PUT, url)
            .body(body)
            .send()
            .await?;
        self.handle_empty_response(response).await?;

        info!(bytes, file_name, "Uploaded package file");
        Ok(TransferOutcome::Completed { bytes })
    }

    /// Sends `GET /user` and succeeds on any 2xx status; the body is not read
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<()> {
        let url = self.endpoint(["user"])?;
        let response = self.authenticated_request(Method::GET, url).send().await?;
        self.handle_empty_response(response).await
    }

    /// The user owning the token
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User> {
        let url = self.endpoint(["user"])?;
        self.get_json(url).await
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Private helper methods

    /// Appends path segments to the API root. Each segment is percent-encoded
    /// on its own, so `group/project` becomes the single segment `group%2Fproject`.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::invalid_url(self.api_root.as_str()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Perform authenticated GET request and deserialize JSON response
    async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.authenticated_request(Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    /// Create authenticated request builder
    fn authenticated_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(PRIVATE_TOKEN_HEADER, self.config.private_token.as_str())
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let retry_after = retry_after(&response);
        let body = response.text().await?;

        // Log response if debug is enabled
        if self.config.debug.log_responses {
            self.log_response_to_file(&url_path, &body);
        }

        if status.is_success() {
            decode::from_str(&body).map_err(|e| ClientError::json_parse(url_path, e))
        } else {
            Err(Self::classify_error(status, &url_path, retry_after, &body))
        }
    }

    /// Like [`Self::handle_response`] for endpoints whose success body is ignored
    async fn handle_empty_response(&self, response: Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    async fn error_from_response(response: Response) -> ClientError {
        let status = response.status();
        let url_path = response.url().path().to_string();
        let retry_after = retry_after(&response);

        match response.text().await {
            Ok(body) => Self::classify_error(status, &url_path, retry_after, &body),
            Err(e) => ClientError::Http(e),
        }
    }

    /// Maps a non-success response onto a [`ClientError`]
    fn classify_error(
        status: StatusCode,
        path: &str,
        retry_after: Option<Duration>,
        body: &str,
    ) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Authentication,
            StatusCode::FORBIDDEN => ClientError::forbidden(path),
            StatusCode::NOT_FOUND => ClientError::not_found(path),
            StatusCode::TOO_MANY_REQUESTS => ClientError::rate_limit(retry_after),
            _ => ClientError::gitlab_api(status.as_u16(), Self::error_message(body)),
        }
    }

    /// Extracts the message from GitLab's error body formats
    fn error_message(body: &str) -> CompactString {
        if let Ok(api_error) = serde_json::from_str::<GitlabApiError>(body) {
            match api_error.error_description {
                Some(description) => format_compact!("{} {}", api_error.error, description),
                None => api_error.error,
            }
        } else if let Ok(api_error2) = serde_json::from_str::<GitlabApiError2>(body) {
            match api_error2.message {
                serde_json::Value::String(message) => message.into(),
                other => format_compact!("{other}"),
            }
        } else {
            body.trim().into()
        }
    }

    /// Build URL for projects endpoint
    fn build_projects_url(&self, query: &ProjectQuery) -> Result<Url> {
        let mut url = self.endpoint(["projects"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if query.membership {
                pairs.append_pair("membership", "true");
            }
            pairs
                .append_pair("order_by", "last_activity_at")
                .append_pair("sort", "desc");
            if let Some(search) = &query.search {
                pairs.append_pair("search", search);
            }
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("per_page", &query.per_page.to_string());
        }

        Ok(url)
    }

    fn build_project_by_path_url(&self, path: &str) -> Result<Url> {
        self.endpoint(["projects", path])
    }

    /// Build URL for repository commits. The date range is only added when set.
    fn build_commits_url(&self, project_id: ProjectId, query: &CommitQuery) -> Result<Url> {
        let id = project_id.to_string();
        let mut url = self.endpoint(["projects", id.as_str(), "repository", "commits"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(ref_name) = &query.ref_name {
                pairs.append_pair("ref_name", ref_name);
            }
            if let Some(since) = query.since {
                pairs.append_pair("since", &since.to_rfc3339());
            }
            if let Some(until) = query.until {
                pairs.append_pair("until", &until.to_rfc3339());
            }
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("per_page", &query.per_page.to_string());
        }

        Ok(url)
    }

    fn build_issues_url(&self, project_id: ProjectId, state: IssueState) -> Result<Url> {
        let id = project_id.to_string();
        let mut url = self.endpoint(["projects", id.as_str(), "issues"])?;
        url.query_pairs_mut()
            .append_pair("state", state.as_str())
            .append_pair("per_page", &ISSUES_PER_PAGE.to_string());

        Ok(url)
    }

    fn build_search_issues_url(&self, search: &str) -> Result<Url> {
        let mut url = self.endpoint(["issues"])?;
        url.query_pairs_mut()
            .append_pair("search", search)
            .append_pair("scope", "all")
            .append_pair("per_page", &ISSUES_PER_PAGE.to_string());

        Ok(url)
    }

    /// Tags of a registry repository, or a single tag when `tag_name` is given
    fn build_registry_tags_url(
        &self,
        project_id: ProjectId,
        repository_id: RepositoryId,
        tag_name: Option<&str>,
    ) -> Result<Url> {
        let id = project_id.to_string();
        let repository = repository_id.to_string();
        let mut segments =
            vec!["projects", id.as_str(), "registry", "repositories", repository.as_str(), "tags"];
        segments.extend(tag_name);

        self.endpoint(segments)
    }

    fn build_generic_package_url(
        &self,
        project_id: ProjectId,
        package_name: &str,
        package_version: &str,
        file_name: &str,
    ) -> Result<Url> {
        let id = project_id.to_string();
        self.endpoint([
            "projects",
            id.as_str(),
            "packages",
            "generic",
            package_name,
            package_version,
            file_name,
        ])
    }

    /// Log HTTP response to file for debugging
    fn log_response_to_file(&self, path: &str, body: &str) {
        if let Some(log_dir) = &self.config.debug.log_directory {
            if !log_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(log_dir) {
                    warn!("Failed to create log directory: {}", e);
                    return;
                }
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S"),
                path.replace('/', "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }
}

/// `<destination>.part`, next to the final file
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn stream_to_file(
    response: &mut Response,
    path: &Path,
    cancel: &CancelFlag,
) -> Result<TransferOutcome> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut bytes = 0u64;
    while let Some(chunk) = response.chunk().await? {
        if cancel.is_cancelled() {
            debug!(bytes, "Cancel requested mid-stream");
            return Ok(TransferOutcome::Cancelled);
        }

        file.write_all(&chunk).await?;
        bytes += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(TransferOutcome::Completed { bytes })
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove partial download");
        }
    }
}

/// Seconds from the `Retry-After` header, when GitLab sends one
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
