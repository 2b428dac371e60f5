//! SharedKey request signing for the Log Analytics ingestion API.
//!
//! The backend authenticates each post by recomputing an HMAC-SHA256 over a
//! canonical string built from request metadata:
//!
//! ```text
//! POST
//! <content length>
//! application/json
//! x-ms-date:<RFC 1123 date, GMT>
//! /api/logs
//! ```
//!
//! The key is the workspace's base64-encoded shared key and the result is
//! sent as `Authorization: SharedKey <workspace id>:<base64 MAC>`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Verb of every ingestion request.
pub const METHOD: &str = "POST";

/// Content type of every ingestion request.
pub const CONTENT_TYPE: &str = "application/json";

/// Ingestion resource path, signed and requested.
pub const RESOURCE_PATH: &str = "/api/logs";

/// Authorization scheme token.
pub const SCHEME: &str = "SharedKey";

/// Signing errors.
///
/// The secret comes from trusted configuration, so any of these is a server
/// fault, never the caller's.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The workspace secret is not valid base64.
    #[error("invalid workspace secret: {0}")]
    InvalidSecret(String),

    /// The `Authorization` header is not `SharedKey <id>:<base64>`.
    #[error("malformed authorization header")]
    MalformedAuthorization,

    /// The signature does not match the request.
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Format `instant` as RFC 1123 with a literal `GMT` zone token.
///
/// The time is rendered in UTC and the `UTC` token is then rewritten to
/// `GMT`; the backend rejects any other spelling.
pub fn rfc1123_timestamp(instant: DateTime<Utc>) -> String {
    instant
        .format("%a, %d %b %Y %H:%M:%S UTC")
        .to_string()
        .replace("UTC", "GMT")
}

/// Build the newline-joined string-to-sign. No trailing newline.
pub fn canonical_string(
    verb: &str,
    content_length: usize,
    content_type: &str,
    timestamp: &str,
    resource_path: &str,
) -> String {
    format!("{verb}\n{content_length}\n{content_type}\nx-ms-date:{timestamp}\n{resource_path}")
}

/// HMAC-SHA256 `message` with the base64 `secret`, returning base64.
pub fn hmac_base64(message: &str, secret: &str) -> Result<String, SignatureError> {
    let key = STANDARD
        .decode(secret)
        .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
    mac.update(message.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Sign request metadata.
///
/// Deterministic: identical inputs, including the timestamp, always produce
/// the identical signature.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidSecret`] if `secret` cannot be decoded.
pub fn sign(
    verb: &str,
    content_length: usize,
    content_type: &str,
    timestamp: &str,
    resource_path: &str,
    secret: &str,
) -> Result<String, SignatureError> {
    let message = canonical_string(verb, content_length, content_type, timestamp, resource_path);
    hmac_base64(&message, secret)
}

/// `SharedKey <workspace id>:<signature>`.
pub fn authorization_header(workspace_id: &str, signature: &str) -> String {
    format!("{SCHEME} {workspace_id}:{signature}")
}

/// Check a received `Authorization` header against the request metadata.
///
/// The MAC comparison is constant time.
///
/// # Errors
///
/// Returns [`SignatureError::MalformedAuthorization`] for an unparsable
/// header and [`SignatureError::VerificationFailed`] when the workspace id or
/// the MAC does not match.
pub fn verify(
    authorization: &str,
    workspace_id: &str,
    content_length: usize,
    timestamp: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    let credentials = authorization
        .strip_prefix(SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or(SignatureError::MalformedAuthorization)?;
    let (id, signature) = credentials
        .split_once(':')
        .ok_or(SignatureError::MalformedAuthorization)?;
    if id != workspace_id {
        return Err(SignatureError::VerificationFailed);
    }
    let provided = STANDARD
        .decode(signature)
        .map_err(|_| SignatureError::MalformedAuthorization)?;

    let key = STANDARD
        .decode(secret)
        .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
    let message = canonical_string(METHOD, content_length, CONTENT_TYPE, timestamp, RESOURCE_PATH);
    mac.update(message.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// Everything computed to sign one forward. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub canonical_string: String,
    pub timestamp: String,
    pub signature: String,
    pub authorization: String,
}

impl SignedRequest {
    /// Sign an ingestion post of `content_length` bytes at `timestamp`.
    pub fn new(
        workspace_id: &str,
        content_length: usize,
        timestamp: String,
        secret: &str,
    ) -> Result<Self, SignatureError> {
        let canonical_string =
            canonical_string(METHOD, content_length, CONTENT_TYPE, &timestamp, RESOURCE_PATH);
        let signature = hmac_base64(&canonical_string, secret)?;
        let authorization = authorization_header(workspace_id, &signature);

        Ok(Self {
            canonical_string,
            timestamp,
            signature,
            authorization,
        })
    }

    /// Sign with the current time.
    pub fn now(
        workspace_id: &str,
        content_length: usize,
        secret: &str,
    ) -> Result<Self, SignatureError> {
        Self::new(
            workspace_id,
            content_length,
            rfc1123_timestamp(Utc::now()),
            secret,
        )
    }
}
