//! The uniform response envelope.
//!
//! Every API answer is shaped as
//! `{"code", "message", "data", "trace_id", "is_encrypted"}`. `code` 0 and
//! 200 both mean success. When `is_encrypted` is set, `data` is a base64
//! string whose decrypted bytes hold the JSON payload.
//!
//! The decrypter is an explicit argument to [`decode`] rather than part of
//! any ambient decoding state.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, DecodeError, DecryptError};

/// Business codes treated as success.
// Both the RPC-style 0 and the HTTP-style 200 are live on the server.
pub const SUCCESS_CODES: [i64; 2] = [0, 200];

/// Reverses the server's encryption of the `data` field.
pub trait Decrypter: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError>;
}

/// A decoded envelope. `data` is `None` whenever `code` signals failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<T>,
    pub trace_id: Option<String>,
    pub is_encrypted: bool,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        SUCCESS_CODES.contains(&self.code)
    }

    /// Unwrap the payload, mapping failure codes to `ApiError::Business`
    /// and a missing payload to `ApiError::NoResponse`.
    pub fn into_data(self) -> Result<T, ApiError> {
        self.into_outcome()?.ok_or(ApiError::NoResponse)
    }

    /// Like `into_data`, but a successful envelope without payload is fine.
    pub fn into_outcome(self) -> Result<Option<T>, ApiError> {
        if !self.is_success() {
            return Err(ApiError::Business {
                code: self.code,
                message: self.message,
            });
        }
        Ok(self.data)
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    trace_id: Option<String>,
    #[serde(default)]
    is_encrypted: Option<bool>,
}

/// Decode an envelope body, decrypting `data` first when the server flagged
/// it as encrypted.
pub fn decode<T: DeserializeOwned>(
    body: &[u8],
    decrypter: Option<&dyn Decrypter>,
) -> Result<Envelope<T>, DecodeError> {
    let raw: RawEnvelope = serde_json::from_slice(body).map_err(DecodeError::Envelope)?;
    let is_encrypted = raw.is_encrypted.unwrap_or(false);
    let is_success = SUCCESS_CODES.contains(&raw.code);

    let data = match raw.data {
        Some(value) if is_success => Some(decode_data(value, is_encrypted, decrypter)?),
        _ => None,
    };

    Ok(Envelope {
        code: raw.code,
        message: raw.message,
        data,
        trace_id: raw.trace_id,
        is_encrypted,
    })
}

fn decode_data<T: DeserializeOwned>(
    value: Value,
    is_encrypted: bool,
    decrypter: Option<&dyn Decrypter>,
) -> Result<T, DecodeError> {
    if !is_encrypted {
        return serde_json::from_value(value).map_err(DecodeError::Payload);
    }

    let decrypter = decrypter.ok_or(DecodeError::MissingDecrypter)?;
    let Value::String(blob) = value else {
        return Err(DecodeError::BlobNotString);
    };
    let ciphertext = STANDARD.decode(blob.as_bytes())?;
    let plaintext = decrypter.decrypt(&ciphertext)?;
    serde_json::from_slice(&plaintext).map_err(DecodeError::Payload)
}
