//! Error types for the data-proxy gateway.
//!
//! Every request-scoped failure is a [`GatewayError`]. Handlers return it and
//! axum turns it into a pretty-printed `{"error": "..."}` body with the
//! matching status code; nothing escapes the request boundary.

use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;
use thiserror::Error;

use crate::forwarder::ForwardError;

/// Errors that end a request without a successful forward.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request body could not be read.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// Path parameters could not be decoded.
    #[error("Invalid path parameters: {0}")]
    InvalidPath(String),

    /// The URL token matches neither a workspace id nor a name.
    #[error("Workspace {token} not found in the proxy config")]
    WorkspaceNotFound {
        /// Token as it appeared in the URL
        token: String,
    },

    /// No route for this method and path.
    #[error("URI path not defined")]
    RouteNotFound,

    /// Signing or forwarding failed.
    #[error("{}", forward_message(.0))]
    Forward(#[from] ForwardError),

    /// A panic was caught at the HTTP boundary.
    #[error("Internal server error")]
    Internal,
}

fn forward_message(err: &ForwardError) -> String {
    match err {
        ForwardError::Upstream { status, body } => format!("Azure {status} API error: {body}"),
        _ => format!("Azure API error: {err}"),
    }
}

impl GatewayError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BodyRead(_) | Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::WorkspaceNotFound { .. } | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Forward(ForwardError::Upstream { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Forward(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        json_response(
            status,
            &ErrorBody {
                error: self.to_string(),
            },
        )
    }
}

/// `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// Pretty-printed JSON body with a trailing newline.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    let mut body = match serde_json::to_string_pretty(value) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )],
                "{\n  \"error\": \"Internal server error\"\n}\n",
            )
                .into_response();
        }
    };
    body.push('\n');

    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response()
}

/// Result type alias for gateway handlers.
pub type GatewayResult<T> = Result<T, GatewayError>;
