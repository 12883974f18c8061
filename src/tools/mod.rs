//! Tool System - Uniform call contract for agent-invoked tools
//!
//! Information Hiding:
//! - Input decoding, logging and span lifecycle live in `dispatch`
//! - Tools only describe themselves and implement their domain action
//! - Process spawning hidden behind `CommandExecutor`
//! - Remote API access hidden behind `RepositoryApi`

pub mod dispatch;
pub mod executor;
pub mod git;
pub mod github;
pub mod registry;
pub mod shell;
pub mod weather;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Static description of a tool: what it is called, what it does and what
/// input it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl fmt::Display for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Json,
}

/// One typed payload of a result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub text: String,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            text: text.into(),
        }
    }

    pub fn json(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Json,
            text: text.into(),
        }
    }
}

/// Result envelope returned by every tool call.
///
/// `is_error` marks a failure the tool handled and reports as data. Structural
/// failures never produce an envelope; they come back as [`ToolError`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn success(content: ToolContent) -> Self {
        Self {
            content: vec![content],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(message)],
            is_error: true,
        }
    }

    /// Concatenated text of every content item, in display order.
    pub fn text(&self) -> String {
        self.content.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn content_length(&self) -> usize {
        self.content.iter().map(|c| c.text.len()).sum()
    }
}

/// A single tool invocation as issued by the agent runtime.
///
/// Arguments are kept as raw JSON text so malformed payloads still reach the
/// decode step and can be logged verbatim.
#[derive(Debug, Clone)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: String,
}

impl CallToolParams {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn from_value(name: impl Into<String>, arguments: &Value) -> Self {
        Self::new(name, arguments.to_string())
    }
}

/// Per-call execution context. Cancelling its token tears down whatever the
/// call is waiting on (child process or HTTP request).
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Transport-level failure: the call itself is structurally broken.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to parse input for tool '{tool}': {source}")]
    InvalidInput {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("failed to resolve ref '{reference}': {message}")]
    RefResolution { reference: String, message: String },
}

/// Failure of the tool's action, reported to the caller inside the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DomainError {
    /// The operation that failed (git subcommand, repository operation, ...).
    pub operation: String,
    pub message: String,
}

impl DomainError {
    pub fn new(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Transport(#[from] ToolError),
}

/// Object-safe tool interface used by the registry and the server.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn call(
        &self,
        ctx: &CallContext,
        params: CallToolParams,
    ) -> Result<CallToolResult, ToolError>;
}

/// Typed tool implementation. Every `ToolHandler` is a [`Tool`] whose calls
/// run through [`dispatch::invoke`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    type Input: DeserializeOwned + Send;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's input object
    fn input_schema(&self) -> Value;

    /// Perform the tool's action on already decoded input.
    async fn handle(
        &self,
        ctx: &CallContext,
        input: Self::Input,
    ) -> Result<ToolContent, HandlerError>;
}

#[async_trait]
impl<H> Tool for H
where
    H: ToolHandler,
{
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    async fn call(
        &self,
        ctx: &CallContext,
        params: CallToolParams,
    ) -> Result<CallToolResult, ToolError> {
        dispatch::invoke(self, ctx, params).await
    }
}
