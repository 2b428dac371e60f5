//! Local stand-in for the Log Analytics ingestion API.
//!
//! Loads the same YAML as the gateway and verifies every SharedKey signature
//! it receives, so the gateway can be exercised end to end without a cloud
//! account:
//!
//! ```text
//! cargo run --features mock --bin mock_backend -- config.yaml --port 8081
//! # gateway config: backend: { scheme: http, host: "localhost:8081" }
//! ```
//!
//! The workspace id is taken from the first label of the `Host` header,
//! mirroring `<id>.<ingestion domain>`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use clap::Parser;
use data_proxy::config::load_config;
use data_proxy::forwarder::API_VERSION;
use data_proxy::signature::{self, CONTENT_TYPE, RESOURCE_PATH};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Mock ingestion backend that verifies SharedKey signatures")]
struct Cli {
    /// Gateway config file providing workspace ids and secrets
    config: PathBuf,

    /// Port to listen on
    #[arg(long, default_value = "8081")]
    port: u16,
}

/// Workspace id → base64 secret.
type Secrets = Arc<HashMap<String, String>>;

#[derive(Debug, Deserialize)]
struct IngestQuery {
    #[serde(rename = "api-version")]
    api_version: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let secrets: HashMap<String, String> = config
        .workspaces
        .into_iter()
        .map(|w| (w.id, w.secret))
        .collect();
    info!(workspaces = secrets.len(), "Loaded workspace secrets");

    let app = Router::new()
        .route(RESOURCE_PATH, post(ingest))
        .with_state(Arc::new(secrets));

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind to {}: {}", addr, e);
        e
    })?;
    info!("Mock ingestion backend listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn ingest(
    State(secrets): State<Secrets>,
    Query(query): Query<IngestQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if query.api_version.as_deref() != Some(API_VERSION) {
        return reject(StatusCode::BAD_REQUEST, "InvalidApiVersion", "Unsupported api-version");
    }

    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let Some(workspace_id) = header_str(header::HOST.as_str())
        .and_then(|host| host.split('.').next())
        .filter(|id| !id.is_empty())
    else {
        return reject(StatusCode::BAD_REQUEST, "InvalidHost", "Missing workspace subdomain");
    };
    let Some(secret) = secrets.get(workspace_id) else {
        return reject(
            StatusCode::NOT_FOUND,
            "WorkspaceNotFound",
            "The workspace could not be found",
        );
    };
    if header_str(header::CONTENT_TYPE.as_str()) != Some(CONTENT_TYPE) {
        return reject(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "InvalidContentType",
            "Content-Type must be application/json",
        );
    }
    let Some(log_type) = header_str("Log-Type").filter(|t| !t.is_empty()) else {
        return reject(StatusCode::BAD_REQUEST, "InvalidLogType", "Log-Type header is missing");
    };
    let (Some(authorization), Some(timestamp)) =
        (header_str(header::AUTHORIZATION.as_str()), header_str("x-ms-date"))
    else {
        return reject(
            StatusCode::FORBIDDEN,
            "MissingApiKey",
            "Authorization and x-ms-date headers are required",
        );
    };

    if let Err(e) = signature::verify(authorization, workspace_id, body.len(), timestamp, secret) {
        warn!(workspace_id = %workspace_id, error = %e, "Rejected signature");
        return reject(
            StatusCode::FORBIDDEN,
            "InvalidAuthorization",
            "An invalid scheme was specified in the Authorization header",
        );
    }

    info!(
        workspace_id = %workspace_id,
        log_type = %log_type,
        bytes = body.len(),
        "Accepted payload"
    );
    StatusCode::OK.into_response()
}

fn reject(status: StatusCode, code: &str, message: &str) -> Response {
    (status, axum::Json(json!({ "Error": code, "Message": message }))).into_response()
}
