//! MCP tool definitions
//!
//! One tool per registry endpoint, plus a raw passthrough for plugin
//! methods the registry does not name.

use serde_json::json;

use super::protocol::Tool;
use crate::registry::ENDPOINTS;

/// Name of the raw passthrough tool
pub const QUERY_TOOL: &str = "query_game";

/// Get all tool definitions for the MCP server
pub fn get_tool_definitions() -> Vec<Tool> {
    let mut tools: Vec<Tool> = ENDPOINTS
        .iter()
        .map(|endpoint| Tool {
            name: endpoint.method.into(),
            description: endpoint.description.into(),
            input_schema: endpoint.shape.input_schema(),
        })
        .collect();

    tools.push(Tool {
        name: QUERY_TOOL.into(),
        description: "Call any game plugin method directly and return its raw JSON result. \
                      Use list_methods to see what the plugin supports."
            .into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "method": {
                    "type": "string",
                    "description": "Plugin method name (e.g. get_production_stats)"
                },
                "params": {
                    "type": "object",
                    "description": "Method parameters such as planetId, itemId, stationId, timeLevel"
                }
            },
            "required": ["method"]
        }),
    });

    tools
}

/// Whether a tool name is served
pub fn is_known_tool(name: &str) -> bool {
    name == QUERY_TOOL || ENDPOINTS.iter().any(|e| e.method == name)
}
