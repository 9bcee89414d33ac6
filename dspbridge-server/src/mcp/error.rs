//! MCP error types

use std::io;

use super::protocol::JsonRpcError;

/// Failures while serving an MCP message
///
/// Query failures never land here; they are tool results with `isError`.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// stdio transport read or write failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON that is not a JSON-RPC request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Tool arguments that do not fit the tool's parameter shape
    #[error("{0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// JSON-RPC code reported to the client
    pub fn code(&self) -> i32 {
        match self {
            McpError::Json(_) => JsonRpcError::PARSE_ERROR,
            McpError::InvalidRequest(_) => JsonRpcError::INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::UnknownTool(_) => {
                JsonRpcError::METHOD_NOT_FOUND
            }
            McpError::InvalidParams(_) => JsonRpcError::INVALID_PARAMS,
            McpError::Io(_) | McpError::Internal(_) => JsonRpcError::INTERNAL_ERROR,
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        JsonRpcError::new(err.code(), err.to_string())
    }
}
