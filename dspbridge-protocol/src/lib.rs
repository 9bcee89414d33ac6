//! dspbridge-protocol: Shared definitions for the query dispatch layer
//!
//! This crate defines the types that cross the dispatcher boundary: method
//! names, the typed parameter bag, the dispatch result, and the JSON-RPC
//! envelopes exchanged with the in-game plugin.

pub mod method;
pub mod outcome;
pub mod params;
pub mod rpc;

// Re-export main types at crate root
pub use method::{InvalidMethodName, MethodName};
pub use outcome::{into_payload, DispatchError, DispatchResult, ErrorKind, FIXTURE_NOT_FOUND};
pub use params::{parse_id, ParamError, QueryParams};
pub use rpc::{RpcRequest, RpcResponse, JSONRPC_VERSION};
