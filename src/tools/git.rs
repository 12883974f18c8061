//! Git Tool
//!
//! Information Hiding:
//! - `git -C` invocation built and run through the injected executor
//! - Blocked-command policy and repository path fallback hidden from callers

use super::executor::{CommandExecutor, CommandSpec, ProcessExecutor};
use super::{CallContext, DomainError, HandlerError, ToolContent, ToolHandler};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const GIT_TOOL_NAME: &str = "git";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    /// Used when a call leaves `repo_path` empty.
    #[serde(default)]
    pub default_repo_path: Option<String>,
    /// Subcommands rejected before any process is spawned.
    #[serde(default)]
    pub blocked_commands: Vec<String>,
}

impl GitConfig {
    fn is_blocked(&self, command: &str) -> bool {
        self.blocked_commands
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(command))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitInput {
    pub command: String,
    pub repo_path: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Runs arbitrary git subcommands against a repository on disk.
pub struct GitTool {
    config: GitConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl GitTool {
    pub fn new(config: GitConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }

    pub fn with_config(config: GitConfig) -> Self {
        Self::new(config, Arc::new(ProcessExecutor::new()))
    }

    fn resolve_repo_path<'a>(&'a self, input: &'a GitInput) -> Option<&'a str> {
        if !input.repo_path.trim().is_empty() {
            return Some(input.repo_path.as_str());
        }
        self.config
            .default_repo_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
    }
}

#[async_trait]
impl ToolHandler for GitTool {
    type Input = GitInput;

    fn name(&self) -> &str {
        GIT_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Performs any Git operation based on the provided command"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Git command to execute"
                },
                "repo_path": {
                    "type": "string",
                    "description": "Path to Git repository"
                },
                "args": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Arguments for the Git command"
                }
            },
            "required": ["command", "repo_path"]
        })
    }

    async fn handle(&self, ctx: &CallContext, input: GitInput) -> Result<ToolContent, HandlerError> {
        let command = input.command.trim();
        if command.is_empty() {
            return Err(DomainError::new(GIT_TOOL_NAME, "git command cannot be empty").into());
        }

        // `command` is always placed right after `-C <repo>`, so it must be
        // the subcommand itself. A global option here would let the real
        // subcommand slip through `args` unchecked.
        if command.starts_with('-') {
            tracing::warn!(command, "Rejected git option in place of a subcommand");
            return Err(DomainError::new(
                command,
                format!("git command '{}' must be a subcommand, not an option", command),
            )
            .into());
        }

        if self.config.is_blocked(command) {
            tracing::warn!(command, "Rejected blocked git command");
            return Err(
                DomainError::new(command, format!("git command '{}' is blocked", command)).into(),
            );
        }

        let repo_path = self
            .resolve_repo_path(&input)
            .ok_or_else(|| DomainError::new(command, "repo_path is required"))?;

        let spec = CommandSpec::git(repo_path, command, &input.args);
        tracing::debug!(command, repo_path, args = ?spec.args, "Executing git command");

        let output = self.executor.execute(ctx, &spec).await.map_err(|err| {
            tracing::debug!(command, error = %err, "Git command failed");
            DomainError::new(command, err)
        })?;

        tracing::debug!(command, output_length = output.len(), "Git command completed successfully");
        Ok(ToolContent::text(String::from_utf8_lossy(&output)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::executor::RecordingExecutor;
    use crate::tools::{CallToolParams, Tool};

    fn call_params(args: Value) -> CallToolParams {
        CallToolParams::from_value("git", &args)
    }

    #[tokio::test]
    async fn test_git_builds_dash_c_invocation() {
        let executor = Arc::new(RecordingExecutor::succeeding("On branch main\n"));
        let tool = GitTool::new(GitConfig::default(), executor.clone());

        let result = tool
            .call(
                &CallContext::new(),
                call_params(json!({"command": "log", "repo_path": "/srv/repo", "args": ["-n", "1"]})),
            )
            .await
            .unwrap();

        assert!(!result.is_error);
        assert_eq!(result.text(), "On branch main\n");
        assert_eq!(executor.calls()[0].args, vec!["-C", "/srv/repo", "log", "-n", "1"]);
    }

    #[tokio::test]
    async fn test_git_failure_carries_output() {
        let executor = Arc::new(RecordingExecutor::failing(
            Some(128),
            "fatal: not a git repository (or any of the parent directories): .git\n",
        ));
        let tool = GitTool::new(GitConfig::default(), executor);

        let result = tool
            .call(
                &CallContext::new(),
                call_params(json!({"command": "status", "repo_path": "/tmp/nonexistent"})),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.text().contains("not a git repository"));
        assert!(result.text().starts_with("exit status 128"));
    }

    #[tokio::test]
    async fn test_blocked_command_never_spawns() {
        let executor = Arc::new(RecordingExecutor::succeeding(""));
        let config = GitConfig {
            default_repo_path: None,
            blocked_commands: vec!["push".to_string()],
        };
        let tool = GitTool::new(config, executor.clone());

        let result = tool
            .call(
                &CallContext::new(),
                call_params(json!({"command": "PUSH", "repo_path": "/srv/repo"})),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(result.text(), "git command 'PUSH' is blocked");
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_global_option_cannot_smuggle_blocked_command() {
        let executor = Arc::new(RecordingExecutor::succeeding(""));
        let config = GitConfig {
            default_repo_path: None,
            blocked_commands: vec!["push".to_string()],
        };
        let tool = GitTool::new(config, executor.clone());

        let result = tool
            .call(
                &CallContext::new(),
                call_params(json!({
                    "command": "-c",
                    "repo_path": "/srv/repo",
                    "args": ["core.x=y", "push", "--force"]
                })),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(result.text(), "git command '-c' must be a subcommand, not an option");
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_long_option_as_command_is_rejected() {
        let executor = Arc::new(RecordingExecutor::succeeding(""));
        let tool = GitTool::new(GitConfig::default(), executor.clone());

        let result = tool
            .call(
                &CallContext::new(),
                call_params(json!({
                    "command": "--git-dir=/elsewhere/.git",
                    "repo_path": "/srv/repo",
                    "args": ["status"]
                })),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_repo_path_uses_default() {
        let executor = Arc::new(RecordingExecutor::succeeding(""));
        let config = GitConfig {
            default_repo_path: Some("/default/repo".to_string()),
            blocked_commands: vec![],
        };
        let tool = GitTool::new(config, executor.clone());

        tool.call(
            &CallContext::new(),
            call_params(json!({"command": "status", "repo_path": ""})),
        )
        .await
        .unwrap();

        assert_eq!(executor.calls()[0].args[1], "/default/repo");
    }

    #[tokio::test]
    async fn test_empty_repo_path_without_default_fails() {
        let executor = Arc::new(RecordingExecutor::succeeding(""));
        let tool = GitTool::new(GitConfig::default(), executor.clone());

        let result = tool
            .call(
                &CallContext::new(),
                call_params(json!({"command": "status", "repo_path": ""})),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(result.text(), "repo_path is required");
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_repo_path_is_transport_error() {
        let tool = GitTool::new(GitConfig::default(), Arc::new(RecordingExecutor::succeeding("")));

        let err = tool
            .call(&CallContext::new(), call_params(json!({"command": "status"})))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("repo_path"));
    }

    #[tokio::test]
    async fn test_real_git_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let tool = GitTool::with_config(GitConfig::default());

        let result = tool
            .call(
                &CallContext::new(),
                call_params(json!({"command": "status", "repo_path": dir.path().to_str().unwrap()})),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.text().contains("not a git repository"));
    }
}
