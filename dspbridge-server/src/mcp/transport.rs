//! MCP transports
//!
//! `http`: one JSON-RPC message per `POST /mcp`. `stdio`: newline-delimited
//! JSON-RPC on stdin/stdout, requests answered concurrently.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::http::{
    empty_response, error_response, json_response, method_not_allowed, not_found, preflight,
    serve, with_cors,
};
use crate::SharedState;

use super::error::McpError;
use super::protocol::{JsonRpcError, JsonRpcResponse};
use super::server::McpServer;

/// Path of the MCP endpoint
pub const MCP_PATH: &str = "/mcp";

/// Header carrying the session id issued on `initialize`
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Largest accepted message, in bytes
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Run the MCP server over HTTP
pub async fn run_http_transport(listener: TcpListener, state: Arc<SharedState>) {
    let server = McpServer::new(Arc::clone(&state.dispatcher));
    let shutdown_rx = state.shutdown_tx.subscribe();

    serve(listener, "MCP", shutdown_rx, move |req| {
        let server = server.clone();
        let state = Arc::clone(&state);
        async move {
            let response = handle_http_request(req, &server).await;
            with_cors(response, &state.config.http.cors_allow_origin)
        }
    })
    .await;
}

/// Handle one HTTP request to the MCP listener
async fn handle_http_request(req: Request<Incoming>, server: &McpServer) -> Response<Full<Bytes>> {
    if req.uri().path() != MCP_PATH {
        return not_found();
    }

    let method = req.method().clone();
    match method {
        Method::OPTIONS => preflight(),
        Method::POST => match Limited::new(req.into_body(), MAX_MESSAGE_BYTES).collect().await {
            Ok(collected) => handle_post(server, &collected.to_bytes()).await,
            Err(e) => {
                warn!(error = %e, "Rejected MCP request body");
                let status = if e.downcast_ref::<LengthLimitError>().is_some() {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                error_response(status, e.to_string())
            }
        },
        _ => method_not_allowed("POST, OPTIONS"),
    }
}

/// Answer one POSTed JSON-RPC message
pub async fn handle_post(server: &McpServer, body: &[u8]) -> Response<Full<Bytes>> {
    let message = String::from_utf8_lossy(body);
    let is_initialize = serde_json::from_str::<Value>(&message)
        .ok()
        .and_then(|v| v.get("method").and_then(Value::as_str).map(|m| m == "initialize"))
        .unwrap_or(false);

    let Some(response) = server.handle_message(&message).await else {
        return empty_response(StatusCode::ACCEPTED);
    };

    let value = match serde_json::to_value(&response) {
        Ok(value) => value,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let mut http_response = json_response(StatusCode::OK, &value);

    if is_initialize && !response.is_error() {
        let session_id = Uuid::new_v4();
        info!(session_id = %session_id, "MCP session started");
        if let Ok(header) = HeaderValue::from_str(&session_id.to_string()) {
            http_response
                .headers_mut()
                .insert(HeaderName::from_static(SESSION_HEADER), header);
        }
    }

    http_response
}

/// Run the MCP server on stdin/stdout
///
/// End of input triggers process shutdown.
pub async fn run_stdio_transport(
    server: McpServer,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), McpError> {
    info!("MCP stdio transport starting");
    let result = serve_lines(
        server,
        tokio::io::stdin(),
        tokio::io::stdout(),
        shutdown_tx.subscribe(),
    )
    .await;
    let _ = shutdown_tx.send(());
    result
}

/// Serve newline-delimited JSON-RPC until EOF or shutdown
pub async fn serve_lines<R, W>(
    server: McpServer,
    reader: R,
    mut writer: W,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), McpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_BYTES));
    let mut pending = FuturesUnordered::new();
    let mut input_open = true;

    while input_open || !pending.is_empty() {
        tokio::select! {
            line = lines.next(), if input_open => match line {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    debug!("Received: {}", line);
                    let server = server.clone();
                    pending.push(async move { server.handle_message(&line).await });
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::new(JsonRpcError::PARSE_ERROR, "Message too large"),
                    );
                    write_response(&mut writer, &response).await?;
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
                None => {
                    info!("MCP input closed");
                    input_open = false;
                }
            },

            Some(response) = pending.next(), if !pending.is_empty() => {
                if let Some(response) = response {
                    write_response(&mut writer, &response).await?;
                }
            }

            _ = shutdown_rx.recv() => {
                info!("MCP stdio transport shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), McpError>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(response)?;
    debug!("Sending: {}", json);
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Backend, Dispatcher, FixtureResolver};
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn fixture_server() -> (TempDir, McpServer) {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("get_stars.json"), r#"[{"id":1,"name":"Sol"}]"#).unwrap();
        let dispatcher = Dispatcher::new(Backend::Fixture(FixtureResolver::new(dir.path())));
        (dir, McpServer::new(Arc::new(dispatcher)))
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_initialize_issues_session() {
        let (_dir, server) = fixture_server();
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}});

        let response = handle_post(&server, body.to_string().as_bytes()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = response.headers()[SESSION_HEADER].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&session).is_ok());
        assert_eq!(body_json(response).await["result"]["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_post_notification_is_accepted() {
        let (_dir, server) = fixture_server();
        let body = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

        let response = handle_post(&server, body).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_post_tool_call() {
        let (_dir, server) = fixture_server();
        let body = json!({
            "jsonrpc": "2.0",
            "id": 9,
            "method": "tools/call",
            "params": {"name": "get_stars", "arguments": {}}
        });

        let response = handle_post(&server, body.to_string().as_bytes()).await;
        assert!(response.headers().get(SESSION_HEADER).is_none());
        let value = body_json(response).await;
        assert_eq!(value["id"], 9);
        let text = value["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!([{"id": 1, "name": "Sol"}])
        );
    }

    #[tokio::test]
    async fn test_post_invalid_json() {
        let (_dir, server) = fixture_server();
        let response = handle_post(&server, b"{oops").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["error"]["code"], JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_serve_lines() {
        let (_dir, server) = fixture_server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"list_planets","arguments":{}}}"#,
            "\n",
        );
        let (_tx, rx) = broadcast::channel(1);
        let mut output = Vec::new();

        serve_lines(server, input.as_bytes(), &mut output, rx)
            .await
            .unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);

        let ids: Vec<_> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
    }

    #[tokio::test]
    async fn test_serve_lines_stops_on_shutdown() {
        let (_dir, server) = fixture_server();
        let (tx, rx) = broadcast::channel(1);
        let (_client, server_end) = tokio::io::duplex(64);
        let (reader, writer) = tokio::io::split(server_end);

        let task = tokio::spawn(serve_lines(server, reader, writer, rx));
        tx.send(()).unwrap();
        assert!(task.await.unwrap().is_ok());
    }
}
