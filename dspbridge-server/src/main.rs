//! dspbridge server - HTTP API and MCP tools over the game plugin

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use dspbridge_protocol::{MethodName, QueryParams};
use dspbridge_utils::{init_logging_with_config, BridgeError, LogConfig, Result};

mod cli;
mod config;
mod dispatch;
mod http;
mod mcp;
mod registry;

use cli::{Cli, Command};
use config::{parse_listen, AppConfig, ConfigLoader, McpTransport, Mode, DEFAULT_CONFIG_TOML};
use dispatch::Dispatcher;
use mcp::McpServer;

/// State shared by every listener
pub struct SharedState {
    /// Query dispatcher built from `config.backend`
    pub dispatcher: Arc<Dispatcher>,
    /// Effective configuration, fixed at startup
    pub config: AppConfig,
    /// Shutdown broadcast
    pub shutdown_tx: broadcast::Sender<()>,
}

impl SharedState {
    /// Build the dispatcher and shutdown channel for a configuration
    pub fn new(config: AppConfig) -> Self {
        let dispatcher = Arc::new(Dispatcher::from_config(&config.backend));
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            dispatcher,
            config,
            shutdown_tx,
        }
    }
}

/// Bind a listener, naming the address on failure
async fn bind(field: &str, addr: &str) -> Result<TcpListener> {
    let socket_addr = parse_listen(field, addr)?;
    TcpListener::bind(socket_addr)
        .await
        .map_err(|e| BridgeError::Bind {
            addr: addr.to_string(),
            source: e,
        })
}

/// Run the HTTP API and MCP surfaces until Ctrl-C or stdio EOF
async fn run_server(config: AppConfig) -> Result<()> {
    ConfigLoader::validate(&config)?;

    match config.backend.mode {
        Mode::Live => info!(
            ws_uri = %config.backend.ws_uri,
            timeout_ms = config.backend.request_timeout_ms,
            "Answering queries from the game plugin"
        ),
        Mode::Fixture => info!(
            fixture_dir = %config.backend.fixture_dir.display(),
            "Answering queries from fixtures"
        ),
    }

    // Bind everything before serving so a taken port fails the start
    let http_listener = if config.http.enabled {
        Some(bind("http.listen", &config.http.listen).await?)
    } else {
        None
    };
    let mcp_listener = if config.mcp.enabled && config.mcp.transport == McpTransport::Http {
        Some(bind("mcp.listen", &config.mcp.listen).await?)
    } else {
        None
    };

    let state = Arc::new(SharedState::new(config));
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let mut tasks = Vec::new();

    if let Some(listener) = http_listener {
        tasks.push(tokio::spawn(http::run_http_server(
            listener,
            Arc::clone(&state),
        )));
    }

    if let Some(listener) = mcp_listener {
        tasks.push(tokio::spawn(mcp::run_http_transport(
            listener,
            Arc::clone(&state),
        )));
    }

    if state.config.mcp.enabled && state.config.mcp.transport == McpTransport::Stdio {
        let server = McpServer::new(Arc::clone(&state.dispatcher));
        let shutdown_tx = state.shutdown_tx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = mcp::run_stdio_transport(server, shutdown_tx).await {
                error!("MCP stdio transport failed: {}", e);
            }
        }));
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutdown requested");
            let _ = state.shutdown_tx.send(());
        }
        _ = shutdown_rx.recv() => {}
    }

    for task in tasks {
        if let Err(e) = task.await {
            warn!("Listener task ended abnormally: {}", e);
        }
    }

    info!("dspbridge server stopped");
    Ok(())
}

/// Run one query and print the result; a failed query exits non-zero
async fn run_query(config: AppConfig, method: &str, params: Option<&str>) -> Result<()> {
    let method =
        MethodName::new(method).map_err(|e| BridgeError::config(format!("method: {}", e)))?;
    let params = match params {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw)
                .map_err(|e| BridgeError::config(format!("--params is not JSON: {}", e)))?;
            QueryParams::from_wire(&value)
                .map_err(|e| BridgeError::config(format!("--params: {}", e)))?
        }
        None => QueryParams::None,
    };

    let dispatcher = Dispatcher::from_config(&config.backend);
    let result = dispatcher.dispatch(&method, &params).await;
    let failed = result.is_err();
    let payload = dspbridge_protocol::into_payload(result);

    let rendered = serde_json::to_string_pretty(&payload)
        .map_err(|e| BridgeError::internal(format!("Failed to render result: {}", e)))?;
    println!("{}", rendered);

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the effective (or documented default) configuration
fn print_config(config: &AppConfig, default: bool) -> Result<()> {
    if default {
        print!("{}", DEFAULT_CONFIG_TOML.trim_start());
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| BridgeError::internal(format!("Failed to render configuration: {}", e)))?;
    print!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_from(cli.config.as_deref())?;
    cli.overrides.apply(&mut config);

    let command = cli.command.unwrap_or(Command::Serve);

    // Logs always go to stderr or file; stdout carries MCP stdio and query output
    let log_config = if cli.verbose {
        LogConfig::development()
    } else if command == Command::Serve {
        LogConfig::server(config.logging.output, &config.logging.filter)
    } else {
        LogConfig::oneshot()
    };
    init_logging_with_config(log_config)?;

    match command {
        Command::Serve => run_server(config).await,
        Command::Query { method, params } => {
            ConfigLoader::validate_backend(&config)?;
            run_query(config, &method, params.as_deref()).await
        }
        Command::Config { default } => print_config(&config, default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_state_follows_config() {
        let mut config = AppConfig::default();
        config.backend.mode = Mode::Fixture;

        let state = SharedState::new(config);
        assert_eq!(state.dispatcher.mode(), Mode::Fixture);
        assert_eq!(state.shutdown_tx.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let err = bind("http.listen", &addr).await.unwrap_err();
        assert!(matches!(err, BridgeError::Bind { .. }));
        assert!(err.to_string().contains(&addr));
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_address() {
        let err = bind("mcp.listen", "nowhere").await.unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_effective_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
