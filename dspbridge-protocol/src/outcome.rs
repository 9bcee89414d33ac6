//! Dispatch results
//!
//! Both backends report failures as values, never as faults. A failure
//! renders to callers as the uniform `{"error": <detail>}` object; the
//! [`ErrorKind`] travels alongside for surfaces that want to expose it
//! without changing that body.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Message returned when a non-listing query has no fixture file
pub const FIXTURE_NOT_FOUND: &str = "Mock data not found";

/// Classification of a dispatch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No fixture file for the query
    FixtureMissing,
    /// Fixture file exists but could not be read or parsed
    FixtureUnreadable,
    /// Connection, timeout, or malformed response from the plugin
    Transport,
    /// The plugin answered with an error member
    Backend,
}

impl ErrorKind {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixtureMissing => "fixture_missing",
            Self::FixtureUnreadable => "fixture_unreadable",
            Self::Transport => "transport",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failed dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchError {
    kind: ErrorKind,
    detail: Value,
}

impl DispatchError {
    /// Create an error with an arbitrary JSON detail
    pub fn new(kind: ErrorKind, detail: impl Into<Value>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// No fixture file for a non-listing query
    pub fn fixture_missing() -> Self {
        Self::new(ErrorKind::FixtureMissing, FIXTURE_NOT_FOUND)
    }

    /// Fixture file could not be read or parsed
    pub fn fixture_unreadable(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::FixtureUnreadable, message.to_string())
    }

    /// Transport failure talking to the plugin
    pub fn transport(reason: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Transport, format!("Connection error: {}", reason))
    }

    /// Error member reported by the plugin, carried verbatim
    pub fn backend(detail: Value) -> Self {
        Self::new(ErrorKind::Backend, detail)
    }

    /// Failure classification
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error detail as reported to callers
    pub fn detail(&self) -> &Value {
        &self.detail
    }

    /// Uniform `{"error": detail}` body
    pub fn to_value(&self) -> Value {
        json!({ "error": self.detail })
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Value::String(message) => f.write_str(message),
            other => write!(f, "{}", other),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Result of one dispatch call
pub type DispatchResult = Result<Value, DispatchError>;

/// Collapse a dispatch result into the JSON body surfaces return
pub fn into_payload(result: DispatchResult) -> Value {
    match result {
        Ok(value) => value,
        Err(err) => err.to_value(),
    }
}
