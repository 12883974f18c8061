//! Agent Tools - schema-described tools for LLM agent runtimes
//!
//! Every tool is invoked through the same contract: raw JSON arguments in,
//! a `CallToolResult` envelope out, with tracing and structured logging
//! around each call. Handled failures travel inside the envelope; only
//! structurally broken calls surface as `ToolError`.

mod config;

pub mod cli;
pub mod server;
pub mod tools;
pub mod utils;

pub use config::{LoggingConfig, Settings};
pub use server::MCPServer;
pub use tools::registry::ToolRegistry;
pub use tools::{
    CallContext, CallToolParams, CallToolResult, ContentType, DomainError, HandlerError, Tool,
    ToolContent, ToolDescriptor, ToolError, ToolHandler,
};
