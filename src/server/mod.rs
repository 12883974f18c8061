//! MCP Server - exposes the tool registry to agent runtimes
//!
//! Information Hiding:
//! - JSON-RPC framing and method routing hidden from tools
//! - Transport errors mapped onto JSON-RPC error objects

pub mod mcp;

pub use mcp::MCPServer;
