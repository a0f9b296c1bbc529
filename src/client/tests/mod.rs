//! Test utilities and common test fixtures for client modules

use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};


/// JSON representation of a project as returned by `/projects`
pub fn sample_project_json() -> serde_json::Value {
    json!({
        "id": 123,
        "name": "project",
        "description": "Test project",
        "visibility": "private",
        "web_url": "https://gitlab.example.com/group/project",
        "star_count": 4,
        "forks_count": 1,
        "open_issues_count": 2,
        "created_at": "2022-06-01T08:00:00.000Z",
        "last_activity_at": "2023-01-01T00:00:00.000Z",
        "archived": false,
        "default_branch": "main",
        "path_with_namespace": "group/project"
    })
}

pub fn projects_json_response() -> serde_json::Value {
    json!([sample_project_json()])
}

pub fn sample_issue_json() -> serde_json::Value {
    json!({
        "id": 9001,
        "iid": 7,
        "title": "Pipeline fails on main",
        "description": "The build job times out",
        "state": "opened",
        "web_url": "https://gitlab.example.com/group/project/-/issues/7",
        "author": {
            "id": 1,
            "username": "ada",
            "name": "Ada Lovelace",
            "avatar_url": null,
            "web_url": "https://gitlab.example.com/ada"
        },
        "assignee": null,
        "created_at": "2023-01-02T10:00:00.000Z",
        "updated_at": "2023-01-03T10:00:00.000Z",
        "closed_at": null,
        "weight": 3,
        "upvotes": 5,
        "downvotes": 0,
        "labels": ["bug", "ci"]
    })
}

pub fn sample_commit_json() -> serde_json::Value {
    json!({
        "id": "ed899a2f4b50b4370feeea94676502b42383c746",
        "short_id": "ed899a2f",
        "title": "Replace sanitize with escape once",
        "message": "Replace sanitize with escape once\n",
        "author_name": "Example User",
        "author_email": "user@example.com",
        "created_at": "2021-09-20T11:50:22.001+03:00",
        "parent_ids": ["6104942438c14ec7bd21c6cd5bd995272b3faff6"],
        "web_url": "https://gitlab.example.com/group/project/-/commit/ed899a2f"
    })
}

pub fn sample_registry_repository_json() -> serde_json::Value {
    json!({
        "id": 2,
        "name": "",
        "path": "group/project",
        "project_id": 123,
        "location": "registry.example.com/group/project",
        "created_at": "2019-01-10T13:38:57.391Z",
        "tags_count": 2,
        "delete_api_path": "https://gitlab.example.com/api/v4/projects/123/registry/repositories/2"
    })
}

pub fn sample_registry_tags_json() -> serde_json::Value {
    json!([
        {
            "name": "latest",
            "path": "group/project:latest",
            "location": "registry.example.com/group/project:latest"
        },
        {
            "name": "v1.0.0",
            "path": "group/project:v1.0.0",
            "location": "registry.example.com/group/project:v1.0.0",
            "digest": "sha256:c3490dcf10ffb6530c1303522a1405dfaf7daecd8f38d3d6",
            "revision": "d7a513a663c1a6dcdba9ed832ca53c02ac2af0c333322cd6ca92936d1d9917ac",
            "short_revision": "d7a513a66",
            "created_at": "2019-01-06T16:49:51.272+00:00",
            "total_size": 350224384
        }
    ])
}

pub fn sample_package_json() -> serde_json::Value {
    json!({
        "id": 1,
        "name": "tanuki-cli",
        "version": "1.0.3",
        "package_type": "generic",
        "created_at": "2019-11-27T03:37:38.711Z"
    })
}

pub fn sample_package_files_json() -> serde_json::Value {
    json!([
        {
            "id": 25,
            "package_id": 1,
            "created_at": "2018-11-07T15:25:52.199Z",
            "file_name": "tanuki-cli-1.0.3.tar.gz",
            "size": 2421,
            "file_sha256": "a903393463309f5d7ad1c2a1fcb0d5a3ec0ca8c0b18b09dd5bd0d2bc3c1aad2e"
        }
    ])
}

pub fn sample_user_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "ada",
        "name": "Ada Lovelace",
        "avatar_url": "https://gitlab.example.com/uploads/ada.png",
        "web_url": "https://gitlab.example.com/ada",
        "email": "ada@example.com"
    })
}

/// Create GitLab API error response
pub fn gitlab_error_response(error: &str, description: Option<&str>) -> serde_json::Value {
    let mut json = json!({
        "error": error
    });

    if let Some(desc) = description {
        json["error_description"] = json!(desc);
    }

    json
}

/// Mock HTTP server for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Create a test config pointing to this mock server
    pub fn test_config(&self) -> crate::client::config::ClientConfig {
        crate::client::config::ClientConfig::new(self.base_url(), "test-token")
    }

    pub fn test_api(&self) -> std::sync::Arc<crate::client::GitlabApi> {
        std::sync::Arc::new(crate::client::GitlabApi::new(self.test_config()).unwrap())
    }
}

/// A hand-driven HTTP server answering a single request. The headers announce
/// `content_length` bytes; `first` is written at once, `rest` only after
/// `release` fires or is dropped. The connection is closed afterwards, so a
/// short `first + rest` ends the body early.
pub struct StalledDownload {
    pub base_url: String,
    /// Fires once the headers and `first` have been written
    pub headers_sent: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

impl StalledDownload {
    pub async fn start(content_length: usize, first: Vec<u8>, rest: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (sent_tx, headers_sent) = oneshot::channel();
        let (release, release_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\
                 Content-Length: {content_length}\r\nConnection: close\r\n\r\n"
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&first).await.unwrap();
            socket.flush().await.unwrap();
            let _ = sent_tx.send(());

            let _ = release_rx.await;
            let _ = socket.write_all(&rest).await;
            let _ = socket.shutdown().await;
        });

        Self { base_url, headers_sent, release }
    }

    pub fn test_api(&self) -> std::sync::Arc<crate::client::GitlabApi> {
        let config = crate::client::config::ClientConfig::new(self.base_url.clone(), "test-token");
        std::sync::Arc::new(crate::client::GitlabApi::new(config).unwrap())
    }
}
