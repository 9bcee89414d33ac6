//! Method names understood by the simulation plugin

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rejected method name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Method name must not be empty")]
pub struct InvalidMethodName;

/// Name of a query the plugin understands (e.g. `list_planets`)
///
/// The set is open: any non-empty string is accepted and passed through to
/// the backend uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodName(String);

impl MethodName {
    /// Create a method name, rejecting the empty string
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidMethodName> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidMethodName);
        }
        Ok(Self(name))
    }

    /// Method name from a compile-time constant
    ///
    /// For static tables; the name must not be empty.
    pub fn from_static(name: &'static str) -> Self {
        debug_assert!(!name.is_empty(), "static method name is empty");
        Self(name.to_string())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this names a listing query
    ///
    /// Listing queries answer with an empty array when no fixture exists.
    pub fn is_listing(&self) -> bool {
        self.0.contains("list")
    }
}

impl TryFrom<String> for MethodName {
    type Error = InvalidMethodName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for MethodName {
    type Error = InvalidMethodName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MethodName> for String {
    fn from(value: MethodName) -> Self {
        value.0
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
