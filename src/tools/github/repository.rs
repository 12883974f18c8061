//! GitHub Repository Tool
//!
//! One tool name fanning out to the repository operations. The `operation`
//! field selects exactly one arm of an exhaustive match; each arm issues one
//! remote call, except `create_branch` which resolves the source ref first.

use super::{GitHubError, NewRepository, ProtectionRequest, RepositoryApi, RepositoryPatch};
use crate::tools::{
    CallContext, DomainError, HandlerError, ToolContent, ToolError, ToolHandler,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub const GITHUB_REPOSITORY_TOOL_NAME: &str = "github_repository";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    Create,
    Delete,
    Update,
    Fork,
    ListBranches,
    CreateBranch,
    ProtectBranch,
}

impl RepositoryOperation {
    pub const ALL: [RepositoryOperation; 7] = [
        Self::Create,
        Self::Delete,
        Self::Update,
        Self::Fork,
        Self::ListBranches,
        Self::CreateBranch,
        Self::ProtectBranch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Fork => "fork",
            Self::ListBranches => "list_branches",
            Self::CreateBranch => "create_branch",
            Self::ProtectBranch => "protect_branch",
        }
    }
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported operation: {0}")]
pub struct UnsupportedOperation(pub String);

impl FromStr for RepositoryOperation {
    type Err = UnsupportedOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnsupportedOperation(s.to_string()))
    }
}

/// Input shared by every operation; fields an operation does not use are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryInput {
    pub operation: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub source_branch: String,
}

pub struct RepositoryTool {
    api: Arc<dyn RepositoryApi>,
}

impl RepositoryTool {
    pub fn new(api: Arc<dyn RepositoryApi>) -> Self {
        Self { api }
    }

    async fn route(
        &self,
        operation: RepositoryOperation,
        input: &RepositoryInput,
    ) -> Result<Value, HandlerError> {
        let owner = input.owner.as_str();
        let repo = input.repo.as_str();

        let result = match operation {
            RepositoryOperation::Create => {
                self.api
                    .create_repository(&NewRepository {
                        name: input.repo.clone(),
                        description: input.description.clone(),
                        private: input.private,
                    })
                    .await
            }
            RepositoryOperation::Delete => self
                .api
                .delete_repository(owner, repo)
                .await
                .map(|()| json!({"status": "deleted"})),
            RepositoryOperation::Update => {
                self.api
                    .edit_repository(
                        owner,
                        repo,
                        &RepositoryPatch {
                            description: input.description.clone(),
                            private: input.private,
                        },
                    )
                    .await
            }
            RepositoryOperation::Fork => self.api.create_fork(owner, repo).await,
            RepositoryOperation::ListBranches => self.api.list_branches(owner, repo).await,
            RepositoryOperation::CreateBranch => return self.create_branch(input).await,
            RepositoryOperation::ProtectBranch => {
                self.api
                    .update_branch_protection(
                        owner,
                        repo,
                        &input.branch,
                        &ProtectionRequest::default(),
                    )
                    .await
            }
        };

        result.map_err(|err| remote_failure(operation, err).into())
    }

    /// Resolve the source branch, then point a new branch at its SHA. A
    /// failed resolution aborts before anything is created.
    async fn create_branch(&self, input: &RepositoryInput) -> Result<Value, HandlerError> {
        let source = format!("refs/heads/{}", input.source_branch);
        let source_ref = self
            .api
            .get_ref(&input.owner, &input.repo, &source)
            .await
            .map_err(|err| ToolError::RefResolution {
                reference: source.clone(),
                message: err.to_string(),
            })?;

        let target = format!("refs/heads/{}", input.branch);
        self.api
            .create_ref(&input.owner, &input.repo, &target, &source_ref.object.sha)
            .await
            .map_err(|err| remote_failure(RepositoryOperation::CreateBranch, err).into())
    }
}

fn remote_failure(operation: RepositoryOperation, err: GitHubError) -> DomainError {
    DomainError::new(
        operation.as_str(),
        format!("github repository {} error: {}", operation, err),
    )
}

#[async_trait]
impl ToolHandler for RepositoryTool {
    type Input = RepositoryInput;

    fn name(&self) -> &str {
        GITHUB_REPOSITORY_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Manages GitHub repositories - create, delete, update, fork"
    }

    fn input_schema(&self) -> Value {
        let operations: Vec<&str> = RepositoryOperation::ALL.iter().map(|op| op.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": operations,
                    "description": "Repository operation to perform"
                },
                "owner": {"type": "string", "description": "Repository owner"},
                "repo": {"type": "string", "description": "Repository name"},
                "description": {"type": "string", "description": "Repository description"},
                "private": {
                    "type": "boolean",
                    "description": "Whether the repository should be private"
                },
                "branch": {"type": "string", "description": "Branch name for branch operations"},
                "source_branch": {
                    "type": "string",
                    "description": "Source branch for new branch creation"
                }
            },
            "required": ["operation"]
        })
    }

    async fn handle(
        &self,
        _ctx: &CallContext,
        input: RepositoryInput,
    ) -> Result<ToolContent, HandlerError> {
        let operation: RepositoryOperation = input
            .operation
            .parse()
            .map_err(|err| DomainError::new(input.operation.as_str(), err))?;

        tracing::info!(%operation, owner = %input.owner, repo = %input.repo, "Handling repository operation");

        let result = self.route(operation, &input).await?;
        let text = serde_json::to_string(&result)
            .map_err(|err| DomainError::new(operation.as_str(), err))?;

        Ok(ToolContent::json(text))
    }
}
