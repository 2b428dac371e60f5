//! Default values for optional configuration fields.

use std::time::Duration;

/// Bind to all interfaces.
pub const LISTEN_IP: &str = "0.0.0.0";

pub const LISTEN_PORT: u16 = 4000;

pub const BACKEND_SCHEME: &str = "https";

pub const BACKEND_HOST: &str = "ods.opinsights.azure.com";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding a base64-encoded config document.
pub const CONFIG_ENV_VAR: &str = "CONFIG_YAML_CONTENT";
