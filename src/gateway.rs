//! HTTP front door.
//!
//! # Routes
//!
//! - `GET /version` - binary version and SHA-256
//! - `GET /stats` - response counts by status code
//! - `POST /azure/workspace/{workspace}/log/{log_name}` - sign and forward
//!
//! # Request Flow (POST)
//!
//! 1. Read path parameters and the full body (400 on failure)
//! 2. Resolve the workspace token by id, then by name (404 on failure)
//! 3. Sign and forward with the canonical id, never the alias
//! 4. Mirror the backend status, or report the failure
//!
//! Stats and the access log are handled once per request by
//! [`access_log`]; handlers never touch them. Panics are caught below the
//! access log and become a generic 500.

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Router, middleware};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, error, info};

use crate::error::{DataBody, GatewayError, GatewayResult, json_response};
use crate::forwarder::LogForwarder;
use crate::logging_layer::{access_log, panic_message};
use crate::registry::WorkspaceRegistry;
use crate::stats::StatsCollector;
use crate::version::VersionInfo;

/// Route of the forwarding endpoint.
pub const WORKSPACE_LOG_ROUTE: &str = "/azure/workspace/{workspace}/log/{log_name}";

const PREFLIGHT_ALLOW_HEADERS: &str = "Content-Type, Access-Control-Allow-Headers";

/// Shared state for every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Workspace lookup (read-only)
    pub registry: Arc<WorkspaceRegistry>,
    /// Backend client
    pub forwarder: Arc<dyn LogForwarder>,
    /// Response counters
    pub stats: Arc<StatsCollector>,
    /// Served by `/version`
    pub version: Arc<VersionInfo>,
}

impl AppState {
    pub fn new(
        registry: WorkspaceRegistry,
        forwarder: Arc<dyn LogForwarder>,
        stats: Arc<StatsCollector>,
        version: VersionInfo,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            forwarder,
            stats,
            version: Arc::new(version),
        }
    }

    /// Resolve, sign, forward and classify one payload.
    ///
    /// Returns the backend's (non-error) status on success.
    pub async fn forward_log(
        &self,
        token: &str,
        log_type: &str,
        body: Bytes,
    ) -> GatewayResult<StatusCode> {
        let workspace = self
            .registry
            .resolve(token)
            .ok_or_else(|| GatewayError::WorkspaceNotFound {
                token: token.to_string(),
            })?;

        debug!(
            token = %token,
            workspace_id = %workspace.id(),
            log_type = %log_type,
            "Workspace resolved"
        );

        let outcome = self
            .forwarder
            .forward(workspace.id(), log_type, workspace.secret(), body)
            .await?;

        Ok(StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::OK))
    }
}

/// Build the gateway router.
///
/// `max_body_bytes` of `None` removes the body limit, so an oversized post
/// reaches the backend and its 413 is mirrored.
///
/// Layer order, outermost first: access log + stats, JSON content type,
/// CORS origin, panic barrier, body limit, routes.
pub fn router(state: AppState, max_body_bytes: Option<usize>) -> Router {
    let stats = Arc::clone(&state.stats);
    let body_limit = match max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route(
            "/version",
            get(version).fallback(|method: Method, headers: HeaderMap| async move {
                unmatched_method(&method, &headers, "GET, OPTIONS")
            }),
        )
        .route(
            "/stats",
            get(response_stats).fallback(|method: Method, headers: HeaderMap| async move {
                unmatched_method(&method, &headers, "GET, OPTIONS")
            }),
        )
        .route(
            WORKSPACE_LOG_ROUTE,
            post(post_workspace_log).fallback(|method: Method, headers: HeaderMap| async move {
                unmatched_method(&method, &headers, "POST, OPTIONS")
            }),
        )
        .fallback(route_not_found)
        .layer(body_limit)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .layer(middleware::from_fn_with_state(stats, access_log))
        .with_state(state)
}

/// `GET /version`
async fn version(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        &DataBody {
            data: state.version.as_ref(),
        },
    )
}

/// `GET /stats`
async fn response_stats(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        &DataBody {
            data: state.stats.snapshot(),
        },
    )
}

/// `POST /azure/workspace/{workspace}/log/{log_name}`
async fn post_workspace_log(
    State(state): State<AppState>,
    params: Result<Path<(String, String)>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<Response> {
    let Path((workspace, log_name)) =
        params.map_err(|e| GatewayError::InvalidPath(e.body_text()))?;
    let body = body.map_err(|e| GatewayError::BodyRead(e.body_text()))?;

    let status = state.forward_log(&workspace, &log_name, body).await?;

    info!(
        workspace = %workspace,
        log_name = %log_name,
        status = status.as_u16(),
        "Payload forwarded"
    );
    Ok(status.into_response())
}

/// Wrong method on a known path. `OPTIONS` answers CORS preflight.
fn unmatched_method(method: &Method, headers: &HeaderMap, allow: &'static str) -> Response {
    if method != Method::OPTIONS {
        return GatewayError::RouteNotFound.into_response();
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(header::ALLOW, HeaderValue::from_static(allow));
    if headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD) {
        response_headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(PREFLIGHT_ALLOW_HEADERS),
        );
        response_headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(allow),
        );
    }
    response
}

/// Any path without a route.
async fn route_not_found() -> GatewayError {
    GatewayError::RouteNotFound
}

/// Panic barrier response. Detail goes to the log only.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    error!(panic = %panic_message(payload.as_ref()), "Recovered from handler panic");
    GatewayError::Internal.into_response()
}
