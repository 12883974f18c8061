use crate::tools::registry::ToolRegistry;
use crate::tools::{CallContext, CallToolParams};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Deserialize)]
struct MCPRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
}

impl MCPResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Serves a tool registry over newline-delimited JSON-RPC 2.0.
pub struct MCPServer {
    registry: Arc<ToolRegistry>,
}

impl MCPServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Read requests until EOF or until `ctx` is cancelled, writing one
    /// response line per request.
    pub async fn serve<R, W>(&self, ctx: &CallContext, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(tools = self.registry.tool_names().len(), "MCP server listening on stdio");

        let mut lines = reader.lines();
        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancellation().cancelled() => {
                    tracing::info!("Shutdown requested, closing MCP server");
                    return Ok(());
                }
                next = lines.next_line() => next?,
            };
            let Some(line) = next else {
                break;
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(ctx, &line).await {
                let mut json = serde_json::to_string(&response)?;
                json.push('\n');
                writer.write_all(json.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("MCP client closed the connection");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications produce no response.
    pub async fn handle_line(&self, ctx: &CallContext, line: &str) -> Option<MCPResponse> {
        let request: MCPRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable MCP message");
                return Some(MCPResponse::failure(Value::Null, PARSE_ERROR, e.to_string()));
            }
        };

        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "Ignoring notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => MCPResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => MCPResponse::success(id, json!({})),
            "tools/list" => MCPResponse::success(id, json!({"tools": self.registry.list_tools()})),
            "tools/call" => self.call_tool(ctx, id, request.params).await,
            other => MCPResponse::failure(id, METHOD_NOT_FOUND, format!("method not found: {}", other)),
        };

        Some(response)
    }

    async fn call_tool(&self, ctx: &CallContext, id: Value, params: Value) -> MCPResponse {
        let params: CallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => return MCPResponse::failure(id, INVALID_PARAMS, e.to_string()),
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let call = CallToolParams::from_value(params.name, &arguments);

        match self.registry.call(ctx, call).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => MCPResponse::success(id, value),
                Err(e) => MCPResponse::failure(id, INTERNAL_ERROR, e.to_string()),
            },
            Err(err) => MCPResponse::failure(id, INVALID_PARAMS, err.to_string()),
        }
    }
}
