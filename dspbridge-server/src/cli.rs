//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{AppConfig, McpTransport, Mode};

/// HTTP and MCP bridge to the Dyson Sphere Program plugin
#[derive(Parser, Debug)]
#[command(name = "dspbridge-server")]
#[command(about = "HTTP and MCP bridge to the Dyson Sphere Program game plugin")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/dspbridge/config.toml)
    #[arg(short, long, global = true, env = "DSPBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API and MCP tools (default)
    Serve,

    /// Run one query and print the JSON result
    Query {
        /// Plugin method name (e.g. list_planets)
        method: String,

        /// Parameters as a JSON object (e.g. '{"planetId": 103}')
        #[arg(short, long)]
        params: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Print the documented default file instead
        #[arg(long)]
        default: bool,
    },
}

/// Settings that override the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Query backend
    #[arg(long, global = true, value_enum, env = "DSPBRIDGE_MODE")]
    pub mode: Option<Mode>,

    /// Plugin WebSocket URI
    #[arg(long, global = true, env = "DSPBRIDGE_WS_URI")]
    pub ws_uri: Option<String>,

    /// Fixture directory for fixture mode
    #[arg(long, global = true, env = "DSPBRIDGE_FIXTURE_DIR")]
    pub fixture_dir: Option<PathBuf>,

    /// Live round trip timeout in milliseconds (0 = unbounded)
    #[arg(long, global = true, env = "DSPBRIDGE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// HTTP API listen address
    #[arg(long, global = true, env = "DSPBRIDGE_HTTP_LISTEN")]
    pub http_listen: Option<String>,

    /// MCP listen address (http transport)
    #[arg(long, global = true, env = "DSPBRIDGE_MCP_LISTEN")]
    pub mcp_listen: Option<String>,

    /// MCP transport
    #[arg(long, global = true, value_enum, env = "DSPBRIDGE_MCP_TRANSPORT")]
    pub mcp_transport: Option<McpTransport>,

    /// Do not serve the HTTP API
    #[arg(long, global = true)]
    pub no_http: bool,

    /// Do not serve MCP tools
    #[arg(long, global = true)]
    pub no_mcp: bool,

    /// Legacy switch: "true" selects fixture mode
    #[arg(long, hide = true, env = "DSP_USE_MOCK")]
    pub use_mock: Option<String>,

    /// Legacy plugin URI variable
    #[arg(long, hide = true, env = "DSP_WS_URI")]
    pub legacy_ws_uri: Option<String>,
}

impl ConfigOverrides {
    /// Apply overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.backend.mode = mode;
        } else if legacy_mock(self.use_mock.as_deref()) {
            config.backend.mode = Mode::Fixture;
        }

        if let Some(uri) = self.ws_uri.as_ref().or(self.legacy_ws_uri.as_ref()) {
            config.backend.ws_uri = uri.clone();
        }
        if let Some(dir) = &self.fixture_dir {
            config.backend.fixture_dir = dir.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.backend.request_timeout_ms = timeout_ms;
        }
        if let Some(listen) = &self.http_listen {
            config.http.listen = listen.clone();
        }
        if let Some(listen) = &self.mcp_listen {
            config.mcp.listen = listen.clone();
        }
        if let Some(transport) = self.mcp_transport {
            config.mcp.transport = transport;
        }
        if self.no_http {
            config.http.enabled = false;
        }
        if self.no_mcp {
            config.mcp.enabled = false;
        }
    }
}

/// Whether the legacy mock switch is on
fn legacy_mock(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
