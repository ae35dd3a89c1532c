//! HTTP server for the RPC layer
//!
//! hyper http1 with TokioIo. Routes:
//! - `POST /rpc/{procedure}` with a JSON body (empty body means `null`)
//! - `GET /health`
//! - `OPTIONS *` CORS preflight

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::{json, Value as Json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use super::context::{create_context, RequestMeta};
use super::router::Router;
use crate::backend::SharedBackend;
use crate::types::{EnaaError, Result};

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Path prefix for procedure calls
pub const RPC_PREFIX: &str = "/rpc/";

/// Largest accepted procedure input (1 MiB)
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared server state
pub struct ServerState {
    pub backend: SharedBackend,
    pub router: Router,
    pub dev_mode: bool,
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(backend: SharedBackend, router: Router, dev_mode: bool) -> Self {
        Self {
            backend,
            router,
            dev_mode,
            started_at: Instant::now(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub git_commit: &'static str,
    pub build_timestamp: &'static str,
    pub mode: &'static str,
    pub uptime: u64,
    pub timestamp: String,
}

/// Accept connections until the listener fails
pub async fn run(listen: SocketAddr, state: Arc<ServerState>) -> Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!("ENAA listening on {}", listen);

    if state.dev_mode {
        warn!("Development mode enabled - in-memory backend, data is not persisted");
    }

    serve(listener, state).await
}

/// Serve on an already-bound listener
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<ServerState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::OPTIONS, _) => preflight_response(),

        (Method::GET, "/health") => json_response(StatusCode::OK, &health(&state)),

        (Method::POST, p) if p.starts_with(RPC_PREFIX) => {
            let name = p[RPC_PREFIX.len()..].to_string();
            match call_procedure(&state, addr, &name, req).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(procedure = %name, code = e.code(), "Procedure failed");
                    error_response(e)
                }
            }
        }

        (_, p) => error_response(EnaaError::NotFound(format!("route {}", p))),
    };

    Ok(to_boxed(response))
}

async fn call_procedure(
    state: &ServerState,
    addr: SocketAddr,
    name: &str,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    if name.is_empty() {
        return Err(EnaaError::BadRequest("missing procedure name".into()));
    }

    let (parts, body) = req.into_parts();
    let input = read_input(body).await?;

    let meta = RequestMeta::new(parts.method, parts.uri.path(), parts.headers).with_remote_addr(addr);
    let ctx = create_context(Arc::clone(&state.backend), meta).await;
    let response_meta = ctx.response.clone();

    let data = state.router.call(name, ctx, input).await?;

    let mut response = json_response(StatusCode::OK, &json!({ "result": { "data": data } }));
    response.headers_mut().extend(response_meta.take_headers());
    Ok(response)
}

/// Collect at most [`MAX_BODY_BYTES`] of JSON input; an empty body is `null`
async fn read_input<B>(body: B) -> Result<Json>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                EnaaError::PayloadTooLarge(format!("input exceeds {} bytes", MAX_BODY_BYTES))
            } else {
                EnaaError::BadRequest(format!("request body: {}", e))
            }
        })?
        .to_bytes();

    if bytes.is_empty() {
        return Ok(Json::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

fn health(state: &ServerState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        git_commit: option_env!("ENAA_GIT_COMMIT").unwrap_or("unknown"),
        build_timestamp: option_env!("ENAA_BUILD_TIMESTAMP").unwrap_or("unknown"),
        mode: if state.dev_mode { "development" } else { "production" },
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

fn with_cors(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = with_cors(Response::new(Full::new(Bytes::new())));
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("authorization, content-type"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = with_cors(Response::new(Full::new(Bytes::from(body))));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => error_response(EnaaError::Internal(format!("response encoding: {}", e))),
    }
}

fn error_response(err: EnaaError) -> Response<Full<Bytes>> {
    let (status, body) = err.into_status_code_and_body();
    let mut response = with_cors(Response::new(Full::new(Bytes::from(body))));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
