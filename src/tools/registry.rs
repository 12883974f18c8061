//! Tool Registry
//!
//! Information Hiding:
//! - Tool storage and lookup implementation hidden
//! - Construction of the default tool set and its collaborators hidden
//! - Unknown tool names mapped onto a transport error

use super::executor::{CommandExecutor, ProcessExecutor};
use super::git::GitTool;
use super::github::{GitHubClient, GitHubError, RepositoryTool};
use super::shell::BashTool;
use super::weather::GetWeatherTool;
use super::{CallContext, CallToolParams, CallToolResult, Tool, ToolDescriptor, ToolError};
use crate::Settings;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name-indexed set of tools. Iteration order is alphabetical.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool, replacing any previous tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.descriptor().name;
        tracing::info!(tool_name = %name, "Registering tool");
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|tool| tool.descriptor()).collect()
    }

    /// Route a call to the tool named in `params`.
    pub async fn call(
        &self,
        ctx: &CallContext,
        params: CallToolParams,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self
            .get(&params.name)
            .ok_or_else(|| ToolError::UnknownTool(params.name.clone()))?;
        tool.call(ctx, params).await
    }

    /// Registry with every built-in tool wired to real collaborators.
    pub fn with_defaults(settings: &Settings) -> Result<Self, GitHubError> {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessExecutor::new());
        let github = GitHubClient::new(&settings.github, Settings::github_token())?;

        let mut registry = Self::new();
        registry.register(Arc::new(BashTool::new(executor.clone())));
        registry.register(Arc::new(GitTool::new(settings.git.clone(), executor)));
        registry.register(Arc::new(GetWeatherTool));
        registry.register(Arc::new(RepositoryTool::new(Arc::new(github))));

        Ok(registry)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
