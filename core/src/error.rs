//! Error types for the API client.
//!
//! # Design
//! `ApiError` is the small taxonomy every call resolves to. Decoding failures
//! are kept apart from transport failures so callers can tell "the server sent
//! something we cannot read" from "we never got a usable answer". Business
//! errors carry the envelope's `code` and `message` verbatim.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed cause carried by capability failures (interceptor, decrypter).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors returned by `ApiClient` build, parse and request methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The envelope reported success but carried no `data`.
    #[error("response carried no data")]
    NoResponse,

    /// Bytes arrived but the envelope or its payload could not be decoded.
    #[error("decoding failed: {0}")]
    Decoding(#[from] DecodeError),

    /// The request never produced a usable response.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The envelope decoded but its `code` signals failure.
    #[error("business error {code}: {}", message.as_deref().unwrap_or("<no message>"))]
    Business { code: i64, message: Option<String> },

    /// Anything that does not match a known shape.
    #[error("unexpected failure: {0}")]
    Unknown(#[source] BoxError),
}

impl ApiError {
    pub fn unknown(cause: impl Into<BoxError>) -> Self {
        ApiError::Unknown(cause.into())
    }

    /// The envelope code of a business error, for re-auth style branching.
    pub fn business_code(&self) -> Option<i64> {
        match self {
            ApiError::Business { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Why an envelope or its payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("payload does not match the expected type: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("encrypted payload received but no decrypter is configured")]
    MissingDecrypter,

    #[error("encrypted payload is not a string blob")]
    BlobNotString,

    #[error("encrypted payload is not valid base64: {0}")]
    Blob(#[from] base64::DecodeError),

    #[error("decryption failed: {0}")]
    Decrypt(#[from] DecryptError),
}

/// Network-level failures, never retried by this layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered outside the 2xx range.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Failure reported by a `Decrypter`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecryptError(#[source] BoxError);

impl DecryptError {
    pub fn new(cause: impl Into<BoxError>) -> Self {
        DecryptError(cause.into())
    }
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("base URL must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}
