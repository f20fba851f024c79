//! GitHub API client.
//!
//! Provides an HTTP client for the GitHub REST v3 contents API with bearer
//! token authentication.

use crate::error::AppError;
use crate::models::RepoId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// GitHub API client configuration.
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Base URL of the REST API (e.g., `https://api.github.com`).
    pub base_url: String,

    /// Personal access token for authentication.
    pub token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::models::config::DEFAULT_API_URL.to_string(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// GitHub API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubClientConfig,
}

/// Authenticated user from `GET /user`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
}

/// Repository from `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubRepository {
    pub id: i64,
    pub full_name: String,
    pub default_branch: String,
    pub private: bool,
    pub html_url: String,
}

/// File entry from `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubContentFile {
    pub name: String,
    pub path: String,
    /// Git blob SHA, required to update the file.
    pub sha: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub encoding: Option<String>,
    pub content: Option<String>,
}

impl GitHubContentFile {
    /// Decode the base64 payload GitHub returns (wrapped at 60 columns).
    ///
    /// Files over 1 MB come back with `encoding: none` and no content; those
    /// are an error here and must be read through the blobs API instead.
    pub fn decoded_content(&self) -> Result<Vec<u8>, AppError> {
        match (self.encoding.as_deref(), self.content.as_deref()) {
            (Some("base64"), Some(content)) if !content.is_empty() || self.size == 0 => {
                decode_content(content)
            }
            (_, None) | (_, Some("")) if self.size == 0 => Ok(Vec::new()),
            (None, Some(content)) if !content.is_empty() => Ok(content.as_bytes().to_vec()),
            (encoding, _) => Err(AppError::github_api(format!(
                "Content of {} ({} bytes, encoding '{}') was not returned inline",
                self.path,
                self.size,
                encoding.unwrap_or("none")
            ))),
        }
    }

    /// Whether GitHub left the content out of the response.
    fn content_omitted(&self) -> bool {
        self.size > 0
            && (self.encoding.as_deref() == Some("none")
                || self.content.as_deref().map_or(true, str::is_empty))
    }
}

/// Blob from `GET /repos/{owner}/{repo}/git/blobs/{sha}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubBlob {
    pub sha: String,
    pub size: i64,
    pub encoding: String,
    pub content: String,
}

/// Commit reference returned from a contents write.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub html_url: Option<String>,
}

/// Written file reference returned from a contents write.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubWrittenFile {
    pub path: String,
    pub sha: String,
}

/// Response of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubFileCommit {
    pub content: Option<GitHubWrittenFile>,
    pub commit: GitHubCommit,
}

/// What `create_or_update_file` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOperation {
    Created,
    Updated,
    /// The remote file already had identical content; nothing was committed.
    Unchanged,
}

/// Result of a create/update/append call.
#[derive(Debug, Clone, Serialize)]
pub struct FileWrite {
    pub operation: WriteOperation,
    pub path: String,
    pub commit_sha: Option<String>,
}

impl FileWrite {
    fn from_commit(operation: WriteOperation, path: &str, commit: GitHubFileCommit) -> Self {
        Self {
            operation,
            path: path.to_string(),
            commit_sha: Some(commit.commit.sha),
        }
    }
}

/// Body of a contents write.
#[derive(Debug, Serialize)]
struct PutFileBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubClient {
    /// Create a new GitHub client.
    pub fn new(config: GitHubClientConfig) -> Result<Self, AppError> {
        if config.token.trim().is_empty() {
            return Err(AppError::authentication(
                "No GitHub token configured. Use `auth login` or `config set token`.",
            ));
        }

        let mut headers = header::HeaderMap::new();

        let mut auth_value =
            header::HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
                .map_err(|_| AppError::authentication("Invalid token format"))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Endpoint for a file inside a repository.
    fn contents_endpoint(repo: &RepoId, path: &str) -> String {
        format!(
            "/repos/{}/{}/contents/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            encode_path(path)
        )
    }

    /// Handle API response errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)));
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::authentication_expired(
                "GitHub token expired or revoked. Please run `repo-courier auth login`.",
            ));
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        // GitHub returns errors as {"message": "...", "documentation_url": "..."}
        let body_message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(String::from));

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::not_found_with_id("GitHub resource", endpoint));
        }

        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || body_message
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains("rate limit"));

        let message = match (status, &body_message) {
            _ if rate_limited => "Rate limit exceeded".to_string(),
            (StatusCode::FORBIDDEN, _) => "Access denied".to_string(),
            (_, Some(msg)) => msg.clone(),
            _ => format!("Request failed ({}): {}", status_code, body),
        };

        Err(AppError::github_api_full(message, status_code, endpoint))
    }

    /// Validate the token by fetching the current user.
    pub async fn validate_token(&self) -> Result<GitHubUser, AppError> {
        let url = self.api_url("/user");
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, "/user").await
    }

    /// Get repository metadata.
    pub async fn get_repository(&self, repo: &RepoId) -> Result<GitHubRepository, AppError> {
        let endpoint = format!(
            "/repos/{}/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        );
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// Fetch a file on a branch.
    ///
    /// # Returns
    /// `None` when the file does not exist (404).
    pub async fn get_file(
        &self,
        repo: &RepoId,
        path: &str,
        branch: &str,
    ) -> Result<Option<GitHubContentFile>, AppError> {
        let endpoint = Self::contents_endpoint(repo, path);
        let url = self.api_url(&endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("ref", branch)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let value: serde_json::Value = self.handle_response(response, &endpoint).await?;
        if value.is_array() {
            return Err(AppError::invalid_input_field(
                format!("'{}' is a directory, not a file", path),
                "path",
            ));
        }

        let mut file: GitHubContentFile = serde_json::from_value(value)?;
        if file.content_omitted() {
            log::debug!(
                "[github] {} is {} bytes, reading it as a blob",
                file.path,
                file.size
            );
            let blob = self.get_blob(repo, &file.sha).await?;
            file.encoding = Some(blob.encoding);
            file.content = Some(blob.content);
        }
        Ok(Some(file))
    }

    /// Fetch a git blob by SHA. Works for files too large for the contents
    /// API.
    pub async fn get_blob(&self, repo: &RepoId, sha: &str) -> Result<GitHubBlob, AppError> {
        let endpoint = format!(
            "/repos/{}/{}/git/blobs/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            urlencoding::encode(sha)
        );
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// PUT a file, creating it when `sha` is `None`, otherwise replacing the
    /// blob with that SHA.
    async fn put_file(
        &self,
        repo: &RepoId,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
        sha: Option<&str>,
    ) -> Result<GitHubFileCommit, AppError> {
        let endpoint = Self::contents_endpoint(repo, path);
        let url = self.api_url(&endpoint);

        let body = PutFileBody {
            message,
            content: STANDARD.encode(content),
            branch,
            sha,
        };

        let response = self.client.put(&url).json(&body).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// Create a new file. Fails (422) if the file already exists.
    pub async fn create_file(
        &self,
        repo: &RepoId,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<FileWrite, AppError> {
        let commit = self.put_file(repo, path, message, content, branch, None).await?;
        Ok(FileWrite::from_commit(WriteOperation::Created, path, commit))
    }

    /// Replace an existing file whose current blob SHA is `sha`.
    pub async fn update_file(
        &self,
        repo: &RepoId,
        path: &str,
        message: &str,
        content: &[u8],
        sha: &str,
        branch: &str,
    ) -> Result<FileWrite, AppError> {
        let commit = self
            .put_file(repo, path, message, content, branch, Some(sha))
            .await?;
        Ok(FileWrite::from_commit(WriteOperation::Updated, path, commit))
    }

    /// Update the file if it exists on the branch, otherwise create it.
    ///
    /// Identical remote content is left untouched.
    pub async fn create_or_update_file(
        &self,
        repo: &RepoId,
        path: &str,
        create_message: &str,
        update_message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<FileWrite, AppError> {
        match self.get_file(repo, path, branch).await? {
            Some(existing) => {
                if existing.decoded_content()? == content {
                    return Ok(FileWrite {
                        operation: WriteOperation::Unchanged,
                        path: path.to_string(),
                        commit_sha: None,
                    });
                }
                self.update_file(repo, path, update_message, content, &existing.sha, branch)
                    .await
            }
            None => {
                self.create_file(repo, path, create_message, content, branch)
                    .await
            }
        }
    }

    /// Append `entry` to a text file, creating the file when it is missing.
    pub async fn append_to_file(
        &self,
        repo: &RepoId,
        path: &str,
        entry: &str,
        create_message: &str,
        update_message: &str,
        branch: &str,
    ) -> Result<FileWrite, AppError> {
        match self.get_file(repo, path, branch).await? {
            Some(existing) => {
                let mut content = existing.decoded_content()?;
                content.extend_from_slice(entry.as_bytes());
                self.update_file(repo, path, update_message, &content, &existing.sha, branch)
                    .await
            }
            None => {
                self.create_file(repo, path, create_message, entry.as_bytes(), branch)
                    .await
            }
        }
    }
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a base64 payload that may contain line breaks.
fn decode_content(content: &str) -> Result<Vec<u8>, AppError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| AppError::github_api(format!("Invalid base64 content: {}", e)))
}
