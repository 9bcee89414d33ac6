//! HTTP query API
//!
//! One read-only GET route per registry endpoint, a raw passthrough under
//! `/api/query/{method}`, plus `/api/config` and `/health`. Every response
//! carries the configured CORS origin.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use dspbridge_protocol::{MethodName, QueryParams};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::Mode;
use crate::registry::match_route;
use crate::SharedState;

/// Header naming the failure class of an error body
pub const DISPATCH_ERROR_HEADER: &str = "x-dispatch-error";

/// Prefix of the raw passthrough route
const QUERY_PREFIX: &str = "/api/query/";

/// Accept connections until shutdown, answering each request with `handler`
pub async fn serve<F, Fut>(
    listener: TcpListener,
    name: &'static str,
    mut shutdown_rx: broadcast::Receiver<()>,
    handler: F,
) where
    F: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("{} listening on http://{}", name, addr);
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                let (stream, remote_addr) = match accept_result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("{} accept error: {}", name, e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let handler = handler.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let handler = handler.clone();
                        async move { Ok::<_, Infallible>(handler(req).await) }
                    });

                    if let Err(e) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        // Connection errors are expected when clients disconnect
                        if !e.is_incomplete_message() {
                            warn!("{} connection error from {}: {}", name, remote_addr, e);
                        }
                    }
                });
            }

            _ = shutdown_rx.recv() => {
                info!("{} shutting down", name);
                break;
            }
        }
    }
}

/// Run the HTTP query API
pub async fn run_http_server(listener: TcpListener, state: Arc<SharedState>) {
    let shutdown_rx = state.shutdown_tx.subscribe();
    serve(listener, "HTTP API", shutdown_rx, move |req| {
        let state = Arc::clone(&state);
        async move { handle_request(req, state).await }
    })
    .await;
}

/// Handle an HTTP request
async fn handle_request(req: Request<Incoming>, state: Arc<SharedState>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let response = route(&method, &path, query.as_deref(), &state).await;
    with_cors(response, &state.config.http.cors_allow_origin)
}

/// Route a request by method and path
pub async fn route(
    method: &Method,
    path: &str,
    query: Option<&str>,
    state: &SharedState,
) -> Response<Full<Bytes>> {
    match *method {
        Method::OPTIONS => return preflight(),
        Method::GET | Method::HEAD => {}
        _ => return method_not_allowed("GET, HEAD, OPTIONS"),
    }

    let pairs = query_pairs(query);

    if let Some(matched) = match_route(path) {
        let params = match matched.params(&pairs) {
            Ok(params) => params,
            Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
        };
        return dispatch(state, &matched.endpoint.method_name(), &params).await;
    }

    if let Some(name) = path.strip_prefix(QUERY_PREFIX) {
        let Ok(method) = MethodName::new(name) else {
            return not_found();
        };
        let params = QueryParams::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        return match params {
            Ok(params) => dispatch(state, &method, &params).await,
            Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        };
    }

    match path {
        "/api/config" => serve_config(state),
        "/health" => text_response(StatusCode::OK, "OK"),
        _ => not_found(),
    }
}

/// Dispatch and render the uniform body
async fn dispatch(
    state: &SharedState,
    method: &MethodName,
    params: &QueryParams,
) -> Response<Full<Bytes>> {
    match state.dispatcher.dispatch(method, params).await {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(err) => {
            debug!(method = %method, kind = %err.kind(), "Query failed");
            let mut response = json_response(StatusCode::OK, &err.to_value());
            response.headers_mut().insert(
                HeaderName::from_static(DISPATCH_ERROR_HEADER),
                HeaderValue::from_static(err.kind().as_str()),
            );
            response
        }
    }
}

/// Serve the effective backend configuration
fn serve_config(state: &SharedState) -> Response<Full<Bytes>> {
    let backend = &state.config.backend;
    json_response(
        StatusCode::OK,
        &json!({
            "mode": backend.mode,
            "use_mock": state.dispatcher.mode() == Mode::Fixture,
            "ws_uri": backend.ws_uri,
            "fixture_dir": backend.fixture_dir,
        }),
    )
}

/// Decode a query string into owned pairs
fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// JSON response with the given status
pub fn json_response(status: StatusCode, value: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(value.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Plain text response
pub fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

/// Response with no body
pub fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Uniform `{"error": message}` body
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": message.into() }))
}

/// 404 Not Found
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// 405 Method Not Allowed
pub fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

/// 204 answer to a CORS preflight
pub fn preflight() -> Response<Full<Bytes>> {
    let mut response = empty_response(StatusCode::NO_CONTENT);
    let headers = response.headers_mut();
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, HEAD, POST, OPTIONS"),
    );
    headers.insert("access-control-allow-headers", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-expose-headers",
        HeaderValue::from_static("mcp-session-id, x-dispatch-error"),
    );
    response
}

/// Attach the allowed CORS origin
pub fn with_cors(mut response: Response<Full<Bytes>>, origin: &str) -> Response<Full<Bytes>> {
    if let Ok(value) = HeaderValue::from_str(origin) {
        response
            .headers_mut()
            .insert("access-control-allow-origin", value);
    }
    response
}
