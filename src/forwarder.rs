//! Backend forwarding client.
//!
//! Posts one signed payload to a workspace's ingestion endpoint and
//! classifies the outcome:
//!
//! - Transport failure (DNS, connect, TLS) → [`ForwardError::Transport`]
//! - Status ≥ 400 → [`ForwardError::Upstream`] carrying the backend's body
//! - Status < 400 → [`ForwardOutcome`], body discarded
//!
//! There is exactly one attempt per call. Ingestion is not idempotent, so a
//! retry could duplicate log records.
//!
//! # Connection Pooling
//!
//! reqwest pools connections per host. Every exit path consumes or drops the
//! response, which returns the connection to the pool or closes it.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderValue;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::{BackendConfig, ConfigError, defaults, parse_duration};
use crate::signature::{CONTENT_TYPE, RESOURCE_PATH, SignatureError, SignedRequest};

/// Ingestion API version query parameter.
pub const API_VERSION: &str = "2016-04-01";

/// Placeholder id used to validate the endpoint template at startup.
const PROBE_WORKSPACE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Endpoint and client settings for the forwarding client.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// `https` in production
    pub scheme: String,
    /// Ingestion domain; the workspace id becomes a subdomain of it
    pub host: String,
    /// Value of the `time-generated-field` header
    pub time_generated_field: String,
    /// TCP + TLS handshake budget
    pub connect_timeout: Duration,
    /// Whole-request budget; `None` waits as long as the backend takes
    pub timeout: Option<Duration>,
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            scheme: defaults::BACKEND_SCHEME.to_string(),
            host: defaults::BACKEND_HOST.to_string(),
            time_generated_field: String::new(),
            connect_timeout: defaults::CONNECT_TIMEOUT,
            timeout: None,
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
        }
    }
}

impl ForwarderConfig {
    /// Build from the `backend` section of the config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBackend`] if scheme and host do not form
    /// an http(s) URL, or [`ConfigError::InvalidDuration`] for bad timeouts.
    pub fn from_backend(backend: &BackendConfig) -> Result<Self, ConfigError> {
        let connect_timeout = parse_duration("backend.connect_timeout", backend.connect_timeout.as_deref())?
            .unwrap_or(defaults::CONNECT_TIMEOUT);
        let timeout = parse_duration("backend.timeout", backend.timeout.as_deref())?;

        let config = Self {
            scheme: backend.scheme.trim().to_ascii_lowercase(),
            host: backend.host.trim().trim_end_matches('/').to_string(),
            time_generated_field: backend.time_generated_field.clone(),
            connect_timeout,
            timeout,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the endpoint template yields a usable URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint(PROBE_WORKSPACE_ID);
        let invalid = |message: String| ConfigError::InvalidBackend {
            endpoint: endpoint.clone(),
            message,
        };

        if self.host.is_empty() {
            return Err(invalid("host is empty".to_string()));
        }
        let url = Url::parse(&endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.path() != RESOURCE_PATH {
            return Err(invalid("host must not contain a path".to_string()));
        }
        Ok(())
    }

    /// Ingestion URL for `workspace_id`.
    pub fn endpoint(&self, workspace_id: &str) -> String {
        format!(
            "{}://{}.{}{}?api-version={}",
            self.scheme, workspace_id, self.host, RESOURCE_PATH, API_VERSION
        )
    }
}

/// Successful forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    /// Backend status, always < 400
    pub status: u16,
}

/// Forwarding failures.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The workspace secret could not be used to sign.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The log type cannot be sent as a header value.
    #[error("invalid log type name '{0}'")]
    InvalidLogType(String),

    /// The backend could not be reached.
    #[error(transparent)]
    Transport(reqwest::Error),

    /// The backend answered with an error status.
    #[error("{body}")]
    Upstream {
        /// Backend status code (≥ 400)
        status: u16,
        /// Backend diagnostic text
        body: String,
    },
}

impl ForwardError {
    /// Backend status code, when the backend answered.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Sends one payload to a workspace's backend.
///
/// The gateway depends on this trait rather than on [`ForwardingClient`], so
/// the HTTP surface can be exercised against in-process fakes.
#[async_trait]
pub trait LogForwarder: Send + Sync {
    /// Sign and post `body` under `log_type` for `workspace_id`.
    async fn forward(
        &self,
        workspace_id: &str,
        log_type: &str,
        secret: &str,
        body: Bytes,
    ) -> Result<ForwardOutcome, ForwardError>;
}

/// reqwest-backed [`LogForwarder`].
///
/// `Clone` is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ForwardingClient {
    client: Client,
    config: ForwarderConfig,
}

impl ForwardingClient {
    /// Create a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the TLS backend cannot initialise.
    pub fn new(config: ForwarderConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_nodelay(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self::with_client(client, config))
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: Client, config: ForwarderConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }
}

#[async_trait]
impl LogForwarder for ForwardingClient {
    async fn forward(
        &self,
        workspace_id: &str,
        log_type: &str,
        secret: &str,
        body: Bytes,
    ) -> Result<ForwardOutcome, ForwardError> {
        let log_type_header = HeaderValue::from_str(log_type)
            .map_err(|_| ForwardError::InvalidLogType(log_type.to_string()))?;

        // One timestamp for both the signature and the x-ms-date header.
        let signed = SignedRequest::now(workspace_id, body.len(), secret)?;
        let url = self.config.endpoint(workspace_id);

        debug!(
            workspace_id = %workspace_id,
            log_type = %log_type,
            bytes = body.len(),
            url = %url,
            "Forwarding payload to backend"
        );

        let response = self
            .client
            .post(&url)
            .header("Log-Type", log_type_header)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("x-ms-date", &signed.timestamp)
            .header("time-generated-field", &self.config.time_generated_field)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(workspace_id = %workspace_id, error = %e, "Backend unreachable");
                ForwardError::Transport(e)
            })?;

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) if status >= 400 => format!("unreadable response body: {e}"),
            Err(e) => {
                warn!(status, error = %e, "Failed to drain backend response body");
                String::new()
            }
        };

        debug!(status, body = %text, "Backend response");

        if status >= 400 {
            return Err(ForwardError::Upstream { status, body: text });
        }
        Ok(ForwardOutcome { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let config = ForwarderConfig::default();
        assert_eq!(
            config.endpoint("01234567-3ca5-4b65-8383-c12a5cda28b3"),
            "https://01234567-3ca5-4b65-8383-c12a5cda28b3.ods.opinsights.azure.com/api/logs?api-version=2016-04-01"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_backend_applies_settings() {
        let backend = BackendConfig {
            scheme: "HTTP".to_string(),
            host: "ingest.test:8080/".to_string(),
            time_generated_field: "EventTime".to_string(),
            connect_timeout: Some("250ms".to_string()),
            timeout: Some("5s".to_string()),
        };
        let config = ForwarderConfig::from_backend(&backend).unwrap();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.host, "ingest.test:8080");
        assert_eq!(config.time_generated_field, "EventTime");
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(
            config.endpoint("ws"),
            "http://ws.ingest.test:8080/api/logs?api-version=2016-04-01"
        );
    }

    #[test]
    fn test_from_backend_defaults() {
        let config = ForwarderConfig::from_backend(&BackendConfig::default()).unwrap();
        assert_eq!(config.connect_timeout, defaults::CONNECT_TIMEOUT);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let backend = BackendConfig {
            scheme: "ftp".to_string(),
            ..BackendConfig::default()
        };
        let err = ForwarderConfig::from_backend(&backend).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackend { .. }));
    }

    #[test]
    fn test_rejects_empty_host_and_path() {
        let backend = BackendConfig {
            host: "  ".to_string(),
            ..BackendConfig::default()
        };
        assert!(ForwarderConfig::from_backend(&backend).is_err());

        let backend = BackendConfig {
            host: "example.com/ingest".to_string(),
            ..BackendConfig::default()
        };
        assert!(ForwarderConfig::from_backend(&backend).is_err());
    }

    #[test]
    fn test_rejects_bad_timeout() {
        let backend = BackendConfig {
            timeout: Some("forever".to_string()),
            ..BackendConfig::default()
        };
        let err = ForwarderConfig::from_backend(&backend).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));
    }

    #[test]
    fn test_upstream_status() {
        let err = ForwardError::Upstream {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.upstream_status(), Some(403));
        assert_eq!(err.to_string(), "forbidden");

        let err = ForwardError::Signature(SignatureError::InvalidSecret("bad".to_string()));
        assert_eq!(err.upstream_status(), None);
    }

    #[tokio::test]
    async fn test_invalid_secret_fails_before_sending() {
        // Port 9 on an unresolvable host: reaching the network would be a bug.
        let config = ForwarderConfig {
            scheme: "http".to_string(),
            host: "invalid.invalid:9".to_string(),
            ..ForwarderConfig::default()
        };
        let client = ForwardingClient::new(config).unwrap();
        let err = client
            .forward("ws", "MyLog", "***", Bytes::from_static(b"[]"))
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Signature(_)));
    }

    #[tokio::test]
    async fn test_invalid_log_type_rejected() {
        let client = ForwardingClient::new(ForwarderConfig::default()).unwrap();
        let err = client
            .forward("ws", "bad\nname", "c2VjcmV0", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::InvalidLogType(_)));
    }
}
