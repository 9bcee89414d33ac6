//! MCP (Model Context Protocol) surface
//!
//! Exposes every registry endpoint as an agent tool over JSON-RPC 2.0.

mod error;
mod protocol;
mod server;
mod tools;
mod transport;

pub use server::McpServer;
pub use transport::{run_http_transport, run_stdio_transport};
