//! Shared integration test helpers.

pub mod mock_backend;
