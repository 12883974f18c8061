//! Bash Tool
//!
//! Information Hiding:
//! - Process spawning delegated to the injected `CommandExecutor`
//! - Output returned byte-for-byte, failures carry the captured output

use super::executor::{CommandExecutor, CommandSpec, ProcessExecutor};
use super::{CallContext, DomainError, HandlerError, ToolContent, ToolHandler};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const BASH_TOOL_NAME: &str = "bash";

#[derive(Debug, Clone, Deserialize)]
pub struct BashInput {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Executes free-form commands through `bash -c`.
pub struct BashTool {
    executor: Arc<dyn CommandExecutor>,
}

impl BashTool {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new(Arc::new(ProcessExecutor::new()))
    }
}

#[async_trait]
impl ToolHandler for BashTool {
    type Input = BashInput;

    fn name(&self) -> &str {
        BASH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Execute bash commands with specified script or command"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Bash command or script to execute"
                },
                "args": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Additional arguments for the command"
                }
            },
            "required": ["command"]
        })
    }

    async fn handle(
        &self,
        ctx: &CallContext,
        input: BashInput,
    ) -> Result<ToolContent, HandlerError> {
        if input.command.trim().is_empty() {
            return Err(DomainError::new(BASH_TOOL_NAME, "command cannot be empty").into());
        }

        tracing::info!(command = %input.command, args = ?input.args, "Executing bash command");

        let spec = CommandSpec::bash(&input.command, &input.args);
        let output = self
            .executor
            .execute(ctx, &spec)
            .await
            .map_err(|err| DomainError::new(input.command.as_str(), err))?;

        Ok(ToolContent::text(String::from_utf8_lossy(&output)))
    }
}
