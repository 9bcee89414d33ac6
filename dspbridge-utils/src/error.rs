//! Process-level errors
//!
//! Startup failures: configuration, logging, listeners. Query failures are
//! values carried by the dispatcher and never become a `BridgeError`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A listener address is taken or not permitted
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// A setting or override that fails validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A config file that is not valid TOML for the schema
    #[error("Invalid configuration in {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// An explicitly named config file that does not exist
    #[error("Configuration file {0} does not exist")]
    ConfigNotFound(PathBuf),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_file_errors_name_the_path() {
        let err = BridgeError::FileRead {
            path: PathBuf::from("/etc/dspbridge/config.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert_eq!(
            err.to_string(),
            "Cannot read /etc/dspbridge/config.toml: permission denied"
        );

        let err = BridgeError::FileWrite {
            path: PathBuf::from("/var/log/dspbridge"),
            source: io::Error::new(io::ErrorKind::Other, "read-only"),
        };
        assert!(err.to_string().starts_with("Cannot write /var/log/dspbridge"));
    }

    #[test]
    fn test_bind_names_the_address() {
        let err = BridgeError::Bind {
            addr: "0.0.0.0:8000".into(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(err.to_string(), "Cannot listen on 0.0.0.0:8000: address in use");
    }

    #[test]
    fn test_config_errors() {
        let err = BridgeError::ConfigInvalid {
            path: PathBuf::from("config.toml"),
            message: "expected a table".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration in config.toml: expected a table"
        );

        let err = BridgeError::ConfigNotFound(PathBuf::from("/missing.toml"));
        assert_eq!(err.to_string(), "Configuration file /missing.toml does not exist");

        assert_eq!(
            BridgeError::config("no surface enabled").to_string(),
            "Configuration error: no surface enabled"
        );
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: BridgeError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        match err {
            BridgeError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("expected Io, got {:?}", other),
        }
    }
}
