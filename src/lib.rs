//! data-proxy - log ingestion gateway library.
//!
//! Accepts log payloads over HTTP and forwards each one to the Log Analytics
//! workspace named in the URL, signing every forward with the workspace's
//! shared key.
//!
//! # Pipeline
//!
//! `POST /azure/workspace/{workspace}/log/{log_name}` →
//! [`registry`] resolves the workspace →
//! [`signature`] signs the request metadata →
//! [`forwarder`] posts to the backend and classifies the answer →
//! [`gateway`] maps the result to a response →
//! [`stats`] counts it.

pub mod config;
pub mod error;
pub mod forwarder;
pub mod gateway;
pub mod logging_layer;
pub mod registry;
pub mod signature;
pub mod stats;
pub mod version;
