//! MCP server core
//!
//! Transport-agnostic JSON-RPC handling. Transports feed raw messages to
//! [`McpServer::handle_message`] and write back whatever response it returns.

use std::sync::Arc;

use dspbridge_protocol::{MethodName, QueryParams};
use serde_json::Value;
use tracing::{debug, info};

use crate::dispatch::Dispatcher;
use crate::registry::find_tool;

use super::error::McpError;
use super::protocol::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolResult, ToolsListResult,
    JSONRPC,
};
use super::tools::{get_tool_definitions, is_known_tool, QUERY_TOOL};

/// Answers MCP requests by dispatching tool calls as game queries
///
/// Cheap to clone; every clone shares the same dispatcher.
#[derive(Debug, Clone)]
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Handle one raw JSON-RPC message
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Unparseable MCP message");
                return Some(JsonRpcResponse::error(Value::Null, McpError::Json(e).into()));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                McpError::InvalidRequest(e.to_string()).into(),
            )),
        }
    }

    /// Answer a decoded request; notifications get `None`
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "MCP notification");
            return None;
        }
        let id = request.id.unwrap_or_default();

        if request.jsonrpc != JSONRPC {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::with_data(
                    JsonRpcError::INVALID_REQUEST,
                    "Unsupported jsonrpc version",
                    serde_json::json!({"expected": JSONRPC, "got": request.jsonrpc}),
                ),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            _ => Err(McpError::MethodNotFound(request.method.clone())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, e.into()),
        })
    }

    fn handle_initialize(&self) -> Result<Value, McpError> {
        info!(mode = %self.dispatcher.mode(), "MCP client initialized");

        let result = InitializeResult::default();
        serde_json::to_value(result).map_err(|e| McpError::Internal(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let tools = get_tool_definitions();
        let result = ToolsListResult { tools };
        serde_json::to_value(result).map_err(|e| McpError::Internal(e.to_string()))
    }

    /// `tools/call`: `{"name": ..., "arguments": {...}}`
    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params["name"]
            .as_str()
            .ok_or_else(|| McpError::InvalidParams("Missing 'name' parameter".into()))?;

        let arguments = &params["arguments"];

        debug!(tool = name, args = %arguments, "Tool call");

        let result = self.dispatch_tool(name, arguments).await?;

        serde_json::to_value(result).map_err(|e| McpError::Internal(e.to_string()))
    }

    /// Dispatch a tool call
    ///
    /// Unknown tools and bad arguments are protocol errors. Dispatch failures
    /// come back as a tool result with `isError` set.
    async fn dispatch_tool(&self, name: &str, arguments: &Value) -> Result<ToolResult, McpError> {
        if !is_known_tool(name) {
            return Err(McpError::UnknownTool(name.into()));
        }

        let (method, params) = match find_tool(name) {
            Some(endpoint) => {
                let params = endpoint
                    .shape
                    .parse_arguments(arguments)
                    .map_err(McpError::InvalidParams)?;
                (endpoint.method_name(), params)
            }
            None => parse_query_arguments(arguments)?,
        };

        let result = self.dispatcher.dispatch(&method, &params).await;

        let tool_result = match result {
            Ok(value) => ToolResult::text(render(&value)?),
            Err(err) => ToolResult::error(render(&err.to_value())?),
        };
        Ok(tool_result)
    }
}

/// Arguments of the raw passthrough tool
fn parse_query_arguments(arguments: &Value) -> Result<(MethodName, QueryParams), McpError> {
    let method = arguments["method"].as_str().ok_or_else(|| {
        McpError::InvalidParams(format!("Missing 'method' parameter for {}", QUERY_TOOL))
    })?;
    let method = MethodName::new(method).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let params = QueryParams::from_wire(&arguments["params"])
        .map_err(|e| McpError::InvalidParams(e.to_string()))?;

    Ok((method, params))
}

fn render(value: &Value) -> Result<String, McpError> {
    serde_json::to_string(value).map_err(|e| McpError::Internal(e.to_string()))
}
