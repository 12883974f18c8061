//! GitHub REST client
//!
//! Information Hiding:
//! - Base URL, auth header and API version negotiation hidden
//! - Error bodies translated into `GitHubError::Api`

use super::{
    GitHubError, GitReference, NewRepository, ProtectionRequest, RepositoryApi, RepositoryPatch,
};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("agent-tools/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// `RepositoryApi` backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, token: Option<String>) -> Result<Self, GitHubError> {
        let base_url = Url::parse(&config.api_url).map_err(|e| GitHubError::BaseUrl {
            url: config.api_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GitHubError::BaseUrl {
                url: config.api_url.clone(),
                reason: "not a hierarchical url".to_string(),
            });
        }

        let http = Client::builder().user_agent(&config.user_agent).build()?;

        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Append `segments` to the base URL, percent-encoding each one so that
    /// `#`, `?` and `/` inside owner, repo or branch names stay in their segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::BaseUrl {
                url: self.base_url.to_string(),
                reason: "not a hierarchical url".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Value, GitHubError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        tracing::debug!(%method, path = %path, "GitHub API request");

        let mut builder = self.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(GitHubError::Api {
                method: method.to_string(),
                path,
                status: status.as_u16(),
                message: error_message(status, &bytes),
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn create_repository(&self, repository: &NewRepository) -> Result<Value, GitHubError> {
        let body = serde_json::to_value(repository)?;
        self.send(Method::POST, &["user", "repos"], Some(&body)).await
    }

    async fn delete_repository(&self, owner: &str, repo: &str) -> Result<(), GitHubError> {
        self.send(Method::DELETE, &["repos", owner, repo], None)
            .await
            .map(|_| ())
    }

    async fn edit_repository(
        &self,
        owner: &str,
        repo: &str,
        patch: &RepositoryPatch,
    ) -> Result<Value, GitHubError> {
        let body = serde_json::to_value(patch)?;
        self.send(Method::PATCH, &["repos", owner, repo], Some(&body))
            .await
    }

    async fn create_fork(&self, owner: &str, repo: &str) -> Result<Value, GitHubError> {
        self.send(Method::POST, &["repos", owner, repo, "forks"], Some(&json!({})))
            .await
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Value, GitHubError> {
        self.send(Method::GET, &["repos", owner, repo, "branches"], None)
            .await
    }

    async fn get_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<GitReference, GitHubError> {
        // The single-ref endpoint takes the ref without its `refs/` prefix,
        // with `/` kept as a path separator between ref components.
        let reference = reference.strip_prefix("refs/").unwrap_or(reference);
        let mut segments = vec!["repos", owner, repo, "git", "ref"];
        segments.extend(reference.split('/'));

        let value = self.send(Method::GET, &segments, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        sha: &str,
    ) -> Result<Value, GitHubError> {
        self.send(
            Method::POST,
            &["repos", owner, repo, "git", "refs"],
            Some(&json!({"ref": reference, "sha": sha})),
        )
        .await
    }

    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        protection: &ProtectionRequest,
    ) -> Result<Value, GitHubError> {
        let body = serde_json::to_value(protection)?;
        self.send(
            Method::PUT,
            &["repos", owner, repo, "branches", branch, "protection"],
            Some(&body),
        )
        .await
    }
}
