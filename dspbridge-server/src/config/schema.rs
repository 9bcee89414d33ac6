//! Configuration schema structs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use dspbridge_utils::LogOutput;
use serde::{Deserialize, Serialize};

use super::defaults::{
    DEFAULT_HTTP_LISTEN, DEFAULT_MCP_LISTEN, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_WS_URI,
};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub http: HttpConfig,
    pub mcp: McpConfig,
    pub logging: LoggingConfig,
}

/// Where query answers come from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Round trip to the running game plugin
    #[default]
    Live,
    /// Recorded responses from the fixture directory
    Fixture,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => f.write_str("live"),
            Mode::Fixture => f.write_str("fixture"),
        }
    }
}

/// Query backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend selection, fixed for the process lifetime
    pub mode: Mode,
    /// WebSocket URI of the game plugin
    pub ws_uri: String,
    /// Root directory of recorded responses
    pub fixture_dir: PathBuf,
    /// Upper bound on one live round trip in milliseconds (0 = unbounded)
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Live,
            ws_uri: DEFAULT_WS_URI.into(),
            fixture_dir: dspbridge_utils::fixture_dir(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl BackendConfig {
    /// Live round trip timeout, if bounded
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

/// HTTP query API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Serve the HTTP API
    pub enabled: bool,
    /// Listen address
    pub listen: String,
    /// Value of `access-control-allow-origin` on every response
    pub cors_allow_origin: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: DEFAULT_HTTP_LISTEN.into(),
            cors_allow_origin: "*".into(),
        }
    }
}

/// MCP transport selection
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    /// JSON-RPC over HTTP POST
    #[default]
    Http,
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
}

/// MCP tool surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Serve the MCP tool surface
    pub enabled: bool,
    /// Transport
    pub transport: McpTransport,
    /// Listen address (http transport only)
    pub listen: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transport: McpTransport::Http,
            listen: DEFAULT_MCP_LISTEN.into(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; `DSPBRIDGE_LOG` takes precedence
    pub filter: String,
    /// Output destination
    pub output: LogOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            output: LogOutput::Stderr,
        }
    }
}
