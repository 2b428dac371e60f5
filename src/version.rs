//! Build identity served by `GET /version`.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Placeholder when the binary cannot be hashed.
pub const UNKNOWN_SHA256: &str = "unknown";

/// Version and content hash of the running binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub binary_version: String,
    pub binary_sha256: String,
}

impl VersionInfo {
    pub fn new(binary_version: impl Into<String>, binary_sha256: impl Into<String>) -> Self {
        Self {
            binary_version: binary_version.into(),
            binary_sha256: binary_sha256.into(),
        }
    }

    /// Crate version plus the hash of the current executable.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the executable cannot be located or read.
    pub fn current() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(env!("CARGO_PKG_VERSION"), file_sha256(&exe)?))
    }
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
