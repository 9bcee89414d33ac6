//! JSON-RPC envelopes exchanged with the in-game plugin
//!
//! One request per connection: the bridge sends an [`RpcRequest`] and reads
//! back exactly one [`RpcResponse`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::method::MethodName;
use crate::params::QueryParams;

/// JSON-RPC version tag sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

/// Request envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Method parameters (empty object when there are none)
    pub params: Map<String, Value>,
    /// Correlation identifier
    pub id: u64,
}

impl RpcRequest {
    /// Build a request for a dispatch call
    pub fn new(method: &MethodName, params: &QueryParams, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.as_str().to_string(),
            params: params.to_wire(),
            id,
        }
    }
}

/// Response envelope
///
/// An `error` member that is present, even as `null`, marks the response as
/// an error. A missing `result` reads as `null`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RpcResponse {
    /// JSON-RPC version, if the plugin sent one
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Correlation identifier echoed by the plugin
    #[serde(default)]
    pub id: Value,
    /// Result payload
    #[serde(default)]
    pub result: Value,
    /// Error payload, `Some` whenever the member is present
    #[serde(default, deserialize_with = "present")]
    pub error: Option<Value>,
}

impl RpcResponse {
    /// Whether the echoed id matches the request id
    ///
    /// Plugins that quote the id as a string still match.
    pub fn matches_id(&self, id: u64) -> bool {
        match &self.id {
            Value::Number(n) => n.as_u64() == Some(id),
            Value::String(s) => s.parse::<u64>().ok() == Some(id),
            _ => false,
        }
    }
}

/// Treat a present member as `Some`, including an explicit `null`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
