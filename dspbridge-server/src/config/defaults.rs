//! Default configuration values
//!
//! These are embedded in the binary and used when no config file exists.

/// Default plugin WebSocket endpoint
pub const DEFAULT_WS_URI: &str = "ws://localhost:18181/";

/// Default HTTP API listen address
pub const DEFAULT_HTTP_LISTEN: &str = "0.0.0.0:8000";

/// Default MCP (http transport) listen address
pub const DEFAULT_MCP_LISTEN: &str = "0.0.0.0:8001";

/// Default bound on one live round trip
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Smallest non-zero round trip bound accepted by validation
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

/// Default configuration as TOML (printed by `dspbridge-server config --default`)
pub const DEFAULT_CONFIG_TOML: &str = r##"
# dspbridge configuration

[backend]
# "live" talks to the game plugin, "fixture" answers from recorded files
mode = "live"
ws_uri = "ws://localhost:18181/"
# fixture_dir = "~/.local/share/dspbridge/fixtures"
# 0 disables the bound
request_timeout_ms = 10000

[http]
enabled = true
listen = "0.0.0.0:8000"
cors_allow_origin = "*"

[mcp]
enabled = true
# "http" serves POST /mcp, "stdio" speaks on stdin/stdout
transport = "http"
listen = "0.0.0.0:8001"

[logging]
# DSPBRIDGE_LOG overrides this filter
filter = "info"
output = "stderr"
"##;
