//! Configuration module for data-proxy.
//!
//! This module provides:
//! - YAML configuration parsing (file or base64 environment variable)
//! - Centralized default values
//! - The fatal [`ConfigError`] taxonomy
//!
//! # Example
//!
//! ```ignore
//! use data_proxy::config::load_config;
//! use data_proxy::registry::WorkspaceRegistry;
//!
//! let config = load_config(Path::new("config.yaml"))?;
//! let registry = WorkspaceRegistry::build(&config.workspaces)?;
//! ```

pub mod defaults;
mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::{
    load_config, load_config_base64, load_config_str, load_from_sources, parse_duration,
};
pub use schema::{BackendConfig, Config, WorkspaceEntry};
