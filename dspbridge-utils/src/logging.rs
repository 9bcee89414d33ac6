//! Tracing subscriber setup
//!
//! Logs never go to stdout, which carries the stdio MCP transport and
//! one-shot query output.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{paths, BridgeError, Result};

/// Environment variable overriding the configured log filter
pub const LOG_ENV: &str = "DSPBRIDGE_LOG";

const LOG_FILE: &str = "dspbridge.log";

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stderr,
    /// `dspbridge.log` under the state directory
    File,
    Both,
}

impl LogOutput {
    fn to_stderr(self) -> bool {
        matches!(self, LogOutput::Stderr | LogOutput::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub output: LogOutput,
    /// `EnvFilter` directive, e.g. "info" or "dspbridge_server=debug,hyper=warn"
    pub filter: String,
    /// Log span enter/exit
    pub span_events: bool,
    /// Include source file and line
    pub file_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            span_events: false,
            file_line: false,
        }
    }
}

impl LogConfig {
    /// Long-running server; `DSPBRIDGE_LOG` wins over the configured filter
    pub fn server(output: LogOutput, configured_filter: &str) -> Self {
        Self {
            output,
            filter: filter_from_env(configured_filter),
            file_line: output.to_file(),
            ..Self::default()
        }
    }

    /// One-shot commands stay quiet unless asked
    pub fn oneshot() -> Self {
        Self {
            filter: filter_from_env("warn"),
            ..Self::default()
        }
    }

    /// `--verbose`
    pub fn development() -> Self {
        Self {
            filter: "debug".into(),
            span_events: true,
            file_line: true,
            ..Self::default()
        }
    }
}

fn filter_from_env(fallback: &str) -> String {
    std::env::var(LOG_ENV).unwrap_or_else(|_| fallback.to_string())
}

/// Install the global subscriber
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| BridgeError::config(format!("Invalid log filter '{}': {}", config.filter, e)))?;

    let spans = if config.span_events {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };

    let stderr_layer = config.output.to_stderr().then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(spans.clone())
            .with_file(config.file_line)
            .with_line_number(config.file_line)
    });

    let file_layer = if config.output.to_file() {
        let file = open_log_file(&paths::log_dir(), LOG_FILE)?;
        Some(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_span_events(spans)
                .with_file(config.file_line)
                .with_line_number(config.file_line),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BridgeError::internal(format!("Failed to install logger: {}", e)))
}

/// Open a log file for appending, creating its directory
fn open_log_file(dir: &Path, name: &str) -> Result<File> {
    std::fs::create_dir_all(dir).map_err(|source| BridgeError::FileWrite {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(name);
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| BridgeError::FileWrite { path, source })
}
