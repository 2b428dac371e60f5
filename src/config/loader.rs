//! Configuration loading.
//!
//! A document can come from a file on disk or, for serverless deployments
//! where no file can be mounted, from a base64-encoded environment variable.
//! Both paths end in [`load_config_str`].

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use super::defaults::CONFIG_ENV_VAR;
use super::error::ConfigError;
use super::schema::Config;

/// Load configuration from a file path.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "Read config file");
    load_config_str(&contents)
}

/// Parse a configuration document.
pub fn load_config_str(contents: &str) -> Result<Config, ConfigError> {
    if contents.trim().is_empty() {
        return Err(ConfigError::EmptyConfigFile);
    }

    let config: Config = serde_yml::from_str(contents)?;

    if config.workspaces.is_empty() {
        return Err(ConfigError::NoWorkspaces);
    }

    Ok(config)
}

/// Parse a base64-encoded configuration document.
pub fn load_config_base64(encoded: &str) -> Result<Config, ConfigError> {
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ConfigError::InvalidEncodedConfig {
            var: CONFIG_ENV_VAR.to_string(),
            message: e.to_string(),
        })?;

    let contents =
        String::from_utf8(decoded).map_err(|e| ConfigError::InvalidEncodedConfig {
            var: CONFIG_ENV_VAR.to_string(),
            message: e.to_string(),
        })?;

    load_config_str(&contents)
}

/// Load from `path` when given, otherwise from the encoded environment value.
pub fn load_from_sources(
    path: Option<&Path>,
    encoded: Option<&str>,
) -> Result<Config, ConfigError> {
    match (path, encoded) {
        (Some(path), _) => load_config(path),
        (None, Some(encoded)) if !encoded.trim().is_empty() => load_config_base64(encoded),
        _ => Err(ConfigError::NoConfigSource {
            var: CONFIG_ENV_VAR.to_string(),
        }),
    }
}

/// Parse an optional humantime duration (`500ms`, `10s`, `1m 30s`).
pub fn parse_duration(field: &str, value: Option<&str>) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };

    humantime::parse_duration(value.trim())
        .map(Some)
        .map_err(|e| ConfigError::InvalidDuration {
            field: field.to_string(),
            value: value.to_string(),
            message: e.to_string(),
        })
}
