//! Configuration loading and validation

use std::net::SocketAddr;
use std::path::Path;

use dspbridge_utils::{config_file, BridgeError, Result};
use hyper::header::HeaderValue;
use tracing::warn;
use url::Url;

use super::defaults::MIN_REQUEST_TIMEOUT_MS;
use super::{AppConfig, McpTransport, Mode};

/// Reads `config.toml` and checks the result before anything binds
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default file if present, else built-in defaults
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load from an explicit path if given, else from the default location
    ///
    /// An explicit path that does not exist is an error.
    pub fn load_from(path: Option<&Path>) -> Result<AppConfig> {
        match path {
            Some(path) if !path.exists() => Err(BridgeError::ConfigNotFound(path.to_path_buf())),
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| BridgeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// `path` only labels errors
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| BridgeError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Full check for `serve`: backend, listeners, CORS origin
    pub fn validate(config: &AppConfig) -> Result<()> {
        Self::validate_backend(config)?;

        if !config.http.enabled && !config.mcp.enabled {
            return Err(BridgeError::config(
                "at least one of [http] or [mcp] must be enabled",
            ));
        }

        if config.http.enabled {
            parse_listen("http.listen", &config.http.listen)?;
        }

        if HeaderValue::from_str(&config.http.cors_allow_origin).is_err() {
            return Err(BridgeError::config(format!(
                "http.cors_allow_origin '{}' is not a valid header value",
                config.http.cors_allow_origin
            )));
        }

        if config.mcp.enabled && config.mcp.transport == McpTransport::Http {
            parse_listen("mcp.listen", &config.mcp.listen)?;
            if config.http.enabled && config.http.listen == config.mcp.listen {
                return Err(BridgeError::config(format!(
                    "http.listen and mcp.listen must differ (both {})",
                    config.http.listen
                )));
            }
        }

        Ok(())
    }

    /// Validate the backend section alone (enough for one-shot queries)
    pub fn validate_backend(config: &AppConfig) -> Result<()> {
        let backend = &config.backend;

        let uri = Url::parse(&backend.ws_uri)
            .map_err(|e| BridgeError::config(format!("ws_uri '{}': {}", backend.ws_uri, e)))?;
        if uri.scheme() != "ws" {
            return Err(BridgeError::config(format!(
                "ws_uri must use the ws:// scheme, got '{}'",
                uri.scheme()
            )));
        }

        if backend.request_timeout_ms != 0 && backend.request_timeout_ms < MIN_REQUEST_TIMEOUT_MS {
            return Err(BridgeError::config(format!(
                "request_timeout_ms must be 0 or at least {}",
                MIN_REQUEST_TIMEOUT_MS
            )));
        }

        if backend.mode == Mode::Fixture && !backend.fixture_dir.is_dir() {
            warn!(
                fixture_dir = %backend.fixture_dir.display(),
                "Fixture directory does not exist; every query will miss"
            );
        }

        Ok(())
    }
}

/// Parse a listen address
pub fn parse_listen(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| BridgeError::config(format!("{} '{}': {}", field, value, e)))
}
