//! YAML configuration document.
//!
//! Only the shape of the document lives here. Validation of the workspace
//! set happens when the [`WorkspaceRegistry`](crate::registry::WorkspaceRegistry)
//! is built, and backend settings are checked by the loader.

use std::fmt;

use serde::Deserialize;

use super::defaults;

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Listen address. Empty or missing means all interfaces.
    #[serde(default)]
    pub listen_ip: Option<String>,

    /// Listen port. Missing or `0` means [`defaults::LISTEN_PORT`].
    #[serde(default)]
    pub listen_port: Option<u16>,

    /// Maximum accepted request body, in bytes. Unlimited when unset.
    #[serde(default)]
    pub max_body_bytes: Option<usize>,

    /// Ingestion backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Workspaces logs can be forwarded to.
    #[serde(default)]
    pub workspaces: Vec<WorkspaceEntry>,
}

impl Config {
    /// Effective listen IP, falling back to all interfaces.
    pub fn listen_ip(&self) -> &str {
        match self.listen_ip.as_deref() {
            Some(ip) if !ip.is_empty() => ip,
            _ => defaults::LISTEN_IP,
        }
    }

    /// Effective listen port, falling back to the default port.
    pub fn listen_port(&self) -> u16 {
        match self.listen_port {
            Some(port) if port != 0 => port,
            _ => defaults::LISTEN_PORT,
        }
    }

    /// `ip:port` string the server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_ip(), self.listen_port())
    }

    /// Request body limit. `None` accepts any size and leaves oversize
    /// rejection to the backend.
    pub fn max_body_bytes(&self) -> Option<usize> {
        self.max_body_bytes
    }
}

/// Backend endpoint and client tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    /// URL scheme used for outbound requests.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Ingestion domain. The workspace id is prepended as a subdomain.
    #[serde(default = "default_host")]
    pub host: String,

    /// Value of the `time-generated-field` header.
    #[serde(default)]
    pub time_generated_field: String,

    /// TCP + TLS handshake budget, humantime format (e.g. `10s`).
    #[serde(default)]
    pub connect_timeout: Option<String>,

    /// Whole-request budget, humantime format. Unset means no timeout.
    #[serde(default)]
    pub timeout: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            time_generated_field: String::new(),
            connect_timeout: None,
            timeout: None,
        }
    }
}

fn default_scheme() -> String {
    defaults::BACKEND_SCHEME.to_string()
}

fn default_host() -> String {
    defaults::BACKEND_HOST.to_string()
}

/// One `workspaces` entry as written in the file.
///
/// Every field defaults to empty so that missing values surface as
/// validation errors naming the entry, not as YAML errors.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub secret: String,
}

impl fmt::Debug for WorkspaceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("WorkspaceEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &secret)
            .finish()
    }
}

impl fmt::Display for WorkspaceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{id: {:?}, name: {:?}}}", self.id, self.name)
    }
}
