//! Live RPC client
//!
//! One WebSocket connection per call: connect, send one JSON-RPC request,
//! read one response, close. Every failure comes back as a
//! [`DispatchError`] value.

use std::time::{Duration, Instant};

use dspbridge_protocol::{
    DispatchError, DispatchResult, MethodName, QueryParams, RpcRequest, RpcResponse,
};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, warn};

/// Transport-level failures, rendered as "Connection error: ..."
#[derive(Debug, thiserror::Error)]
enum LiveError {
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode request: {0}")]
    Encode(serde_json::Error),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("connection closed before response")]
    Closed,

    #[error("request timed out after {0}ms")]
    Timeout(u128),
}

/// Client for the plugin's JSON-RPC WebSocket endpoint
#[derive(Debug, Clone)]
pub struct LiveClient {
    uri: String,
    timeout: Option<Duration>,
}

impl LiveClient {
    /// Create a client; `timeout` bounds each whole round trip
    pub fn new(uri: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            uri: uri.into(),
            timeout,
        }
    }

    /// Perform one request/response round trip
    pub async fn call(&self, method: &MethodName, params: &QueryParams) -> DispatchResult {
        let id = u64::from(fastrand::u32(1..));
        let request = RpcRequest::new(method, params, id);
        let started = Instant::now();

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(&request))
                .await
                .unwrap_or_else(|_| Err(LiveError::Timeout(limit.as_millis()))),
            None => self.round_trip(&request).await,
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                if !response.matches_id(id) {
                    debug!(method = %method, sent = id, received = %response.id, "Response id mismatch");
                }
                match response.error {
                    Some(detail) => {
                        warn!(method = %method, elapsed_ms, error = %detail, "Plugin reported an error");
                        Err(DispatchError::backend(detail))
                    }
                    None => {
                        debug!(method = %method, elapsed_ms, "Plugin answered");
                        Ok(response.result)
                    }
                }
            }
            Err(e) => {
                error!(method = %method, uri = %self.uri, elapsed_ms, error = %e, "Plugin round trip failed");
                Err(DispatchError::transport(e))
            }
        }
    }

    async fn round_trip(&self, request: &RpcRequest) -> Result<RpcResponse, LiveError> {
        let payload = serde_json::to_string(request).map_err(LiveError::Encode)?;

        let (mut ws, _) = connect_async(self.uri.as_str()).await?;
        ws.send(Message::Text(payload)).await?;

        let response: RpcResponse = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break serde_json::from_str(&text)?,
                Some(Ok(Message::Binary(bytes))) => break serde_json::from_slice(&bytes)?,
                Some(Ok(Message::Close(_))) | None => return Err(LiveError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        };

        // The answer is already in hand
        let _ = ws.close(None).await;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dspbridge_protocol::ErrorKind;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[derive(Clone)]
    enum Behavior {
        /// Send this envelope back
        Reply(Value),
        /// Send this text frame back
        Raw(String),
        /// Close without answering
        Close,
        /// Never answer
        Stall,
        /// Answer with the received request as the result
        Echo,
    }

    async fn spawn_plugin(behavior: Behavior) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let behavior = behavior.clone();
                tokio::spawn(async move {
                    let Ok(mut ws) = accept_async(stream).await else {
                        return;
                    };
                    let request = match ws.next().await {
                        Some(Ok(Message::Text(text))) => text,
                        _ => return,
                    };

                    match behavior {
                        Behavior::Reply(envelope) => {
                            let _ = ws.send(Message::Text(envelope.to_string())).await;
                        }
                        Behavior::Raw(text) => {
                            let _ = ws.send(Message::Text(text)).await;
                        }
                        Behavior::Close => {
                            let _ = ws.close(None).await;
                        }
                        Behavior::Stall => {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                        }
                        Behavior::Echo => {
                            let request: Value = serde_json::from_str(&request).unwrap();
                            let envelope = json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "result": request,
                            });
                            let _ = ws.send(Message::Text(envelope.to_string())).await;
                        }
                    }

                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });

        format!("ws://{}/", addr)
    }

    fn method(name: &str) -> MethodName {
        MethodName::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_call_returns_result_verbatim() {
        let uri = spawn_plugin(Behavior::Reply(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"gameTick": 123456, "planets": [1, 2]}
        })))
        .await;
        let client = LiveClient::new(uri, Some(Duration::from_secs(5)));

        let result = client.call(&method("get_game_info"), &QueryParams::None).await;
        assert_eq!(result, Ok(json!({"gameTick": 123456, "planets": [1, 2]})));
    }

    #[tokio::test]
    async fn test_call_sends_request_envelope() {
        let uri = spawn_plugin(Behavior::Echo).await;
        let client = LiveClient::new(uri, Some(Duration::from_secs(5)));

        let echoed = client
            .call(&method("get_planet_resources"), &QueryParams::planet(42))
            .await
            .unwrap();
        assert_eq!(echoed["jsonrpc"], "2.0");
        assert_eq!(echoed["method"], "get_planet_resources");
        assert_eq!(echoed["params"], json!({"planetId": 42}));
        assert!(echoed["id"].as_u64().is_some_and(|id| id > 0));

        let echoed = client.call(&method("ping"), &QueryParams::None).await.unwrap();
        assert_eq!(echoed["params"], json!({}));
    }

    #[tokio::test]
    async fn test_mixed_params_reach_the_wire_intact() {
        let uri = spawn_plugin(Behavior::Echo).await;
        let client = LiveClient::new(uri, Some(Duration::from_secs(5)));

        for bag in [
            json!({"planetId": 103, "itemId": 1120}),
            json!({"stationId": 7}),
            json!({"planetId": "mars"}),
        ] {
            let params = QueryParams::from_wire(&bag).unwrap();
            let echoed = client.call(&method("get_item_flow"), &params).await.unwrap();
            assert_eq!(echoed["params"], bag);
        }
    }

    #[tokio::test]
    async fn test_null_result_is_success() {
        let uri = spawn_plugin(Behavior::Reply(json!({"jsonrpc": "2.0", "id": 1, "result": null}))).await;
        let client = LiveClient::new(uri, None);

        assert_eq!(client.call(&method("get_ships"), &QueryParams::None).await, Ok(Value::Null));
    }

    #[tokio::test]
    async fn test_backend_error_passes_through_unchanged() {
        let detail = json!({"code": -32601, "message": "Method not found: get_nothing"});
        let uri = spawn_plugin(Behavior::Reply(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": detail
        })))
        .await;
        let client = LiveClient::new(uri, Some(Duration::from_secs(5)));

        let err = client
            .call(&method("get_nothing"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.to_value(), json!({"error": detail}));
    }

    #[tokio::test]
    async fn test_premature_close_is_connection_error() {
        let uri = spawn_plugin(Behavior::Close).await;
        let client = LiveClient::new(uri, Some(Duration::from_secs(5)));

        let err = client
            .call(&method("get_game_info"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().starts_with("Connection error: "));
    }

    #[tokio::test]
    async fn test_malformed_response_is_connection_error() {
        let uri = spawn_plugin(Behavior::Raw("this is not json".into())).await;
        let client = LiveClient::new(uri, Some(Duration::from_secs(5)));

        let err = client
            .call(&method("get_game_info"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("malformed response"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LiveClient::new(format!("ws://{}/", addr), Some(Duration::from_secs(5)));
        let err = client
            .call(&method("list_planets"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_value()["error"]
            .as_str()
            .unwrap()
            .starts_with("Connection error: "));
    }

    #[tokio::test]
    async fn test_timeout_is_connection_error() {
        let uri = spawn_plugin(Behavior::Stall).await;
        let client = LiveClient::new(uri, Some(Duration::from_millis(200)));

        let err = client
            .call(&method("get_game_info"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.to_string(), "Connection error: request timed out after 200ms");
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let uri = spawn_plugin(Behavior::Echo).await;
        let client = LiveClient::new(uri, Some(Duration::from_secs(5)));

        let calls = (0..8).map(|planet_id| {
            let client = client.clone();
            async move {
                client
                    .call(&method("get_power_grids_by_planet"), &QueryParams::planet(planet_id))
                    .await
            }
        });
        let results = futures::future::join_all(calls).await;

        for (planet_id, result) in results.into_iter().enumerate() {
            let echoed = result.unwrap();
            assert_eq!(echoed["params"]["planetId"], planet_id as i64);
        }
    }
}
