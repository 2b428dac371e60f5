//! Configuration error types.
//!
//! Every variant is fatal: the process refuses to start.

use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    // ─────────────────────────────────────────────────────────────────────────
    // Workspace validation errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The workspace list is missing or empty.
    #[error("must have at least one workspace, aborting")]
    NoWorkspaces,

    /// An entry has no id.
    #[error("missing id for workspace {entry}")]
    MissingWorkspaceId { entry: String },

    /// An id is not a lowercase canonical UUID.
    #[error("{id} is not a valid workspace ID")]
    InvalidWorkspaceId { id: String },

    /// The same id appears twice.
    #[error("found duplicate workspace id ({id})")]
    DuplicateWorkspaceId { id: String },

    /// An entry has no secret.
    #[error("missing secret for workspace {id}")]
    MissingSecret { id: String },

    /// The same name appears twice.
    #[error("found duplicate workspace name ({name})")]
    DuplicateWorkspaceName { name: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Value validation errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Backend scheme/host do not form a valid URL.
    #[error("invalid backend endpoint '{endpoint}': {message}")]
    InvalidBackend { endpoint: String, message: String },

    /// A humantime duration could not be parsed.
    #[error("invalid duration '{value}' for '{field}': {message}")]
    InvalidDuration {
        field: String,
        value: String,
        message: String,
    },

    /// The reqwest client could not be built from the backend settings.
    #[error("cannot build backend client: {0}")]
    Client(String),

    // ─────────────────────────────────────────────────────────────────────────
    // I/O and parsing errors
    // ─────────────────────────────────────────────────────────────────────────
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    ParseError(#[from] serde_yml::Error),

    /// I/O error reading config file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Empty configuration document.
    #[error("configuration file is empty")]
    EmptyConfigFile,

    /// The environment variable config is not valid base64.
    #[error("environment variable '{var}' cannot be base64 decoded: {message}")]
    InvalidEncodedConfig { var: String, message: String },

    /// Neither a config path nor the environment variable was provided.
    #[error("no configuration given: pass a config file path or set {var}")]
    NoConfigSource { var: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_error_display() {
        let err = ConfigError::DuplicateWorkspaceId {
            id: "01234567-3ca5-4b65-8383-c12a5cda28b3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "found duplicate workspace id (01234567-3ca5-4b65-8383-c12a5cda28b3)"
        );

        let err = ConfigError::InvalidWorkspaceId {
            id: "two".to_string(),
        };
        assert_eq!(err.to_string(), "two is not a valid workspace ID");
    }

    #[test]
    fn test_no_workspaces_display() {
        assert_eq!(
            ConfigError::NoWorkspaces.to_string(),
            "must have at least one workspace, aborting"
        );
    }
}
