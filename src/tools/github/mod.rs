//! GitHub Tools
//!
//! Information Hiding:
//! - REST transport details hidden behind `RepositoryApi`
//! - Operation routing hidden inside the repository tool
//! - Request payload shapes owned by this module

pub mod client;
pub mod repository;

pub use client::{GitHubClient, GitHubConfig};
pub use repository::{RepositoryInput, RepositoryOperation, RepositoryTool};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{method} {path}: {status} {message}")]
    Api {
        method: String,
        path: String,
        status: u16,
        message: String,
    },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid GitHub API url '{url}': {reason}")]
    BaseUrl { url: String, reason: String },
}

/// Body of `POST /user/repos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
}

/// Body of `PATCH /repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryPatch {
    pub description: String,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitReference {
    #[serde(rename = "ref")]
    pub reference: String,
    pub object: GitObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredStatusChecks {
    pub strict: bool,
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestReviewsEnforcement {
    pub required_approving_review_count: u32,
}

/// Body of `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// GitHub requires every top-level key to be present, so the unused ones
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectionRequest {
    pub required_status_checks: RequiredStatusChecks,
    pub required_pull_request_reviews: PullRequestReviewsEnforcement,
    pub enforce_admins: Option<bool>,
    pub restrictions: Option<Value>,
}

impl Default for ProtectionRequest {
    /// Strict status checks plus one approving review.
    fn default() -> Self {
        Self {
            required_status_checks: RequiredStatusChecks {
                strict: true,
                contexts: Vec::new(),
            },
            required_pull_request_reviews: PullRequestReviewsEnforcement {
                required_approving_review_count: 1,
            },
            enforce_admins: None,
            restrictions: None,
        }
    }
}

/// The remote repository operations the repository tool can issue.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn create_repository(&self, repository: &NewRepository) -> Result<Value, GitHubError>;

    async fn delete_repository(&self, owner: &str, repo: &str) -> Result<(), GitHubError>;

    async fn edit_repository(
        &self,
        owner: &str,
        repo: &str,
        patch: &RepositoryPatch,
    ) -> Result<Value, GitHubError>;

    async fn create_fork(&self, owner: &str, repo: &str) -> Result<Value, GitHubError>;

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Value, GitHubError>;

    /// Resolve a fully qualified ref such as `refs/heads/main`.
    async fn get_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<GitReference, GitHubError>;

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        sha: &str,
    ) -> Result<Value, GitHubError>;

    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        protection: &ProtectionRequest,
    ) -> Result<Value, GitHubError>;
}
