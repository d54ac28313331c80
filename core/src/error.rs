//! Error types for the Talos API client.
//!
//! # Design
//! The variants follow the order in which a call can fail: the request body
//! cannot be encoded, the network round-trip fails, the server answers with a
//! non-2xx status, or a 2xx body does not match the expected shape. Status
//! failures are detected before any decoding is attempted, so a 500 with a
//! garbage body is always an `HttpError`, never a `DeserializationError`.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by `TalosClient` and `BlockingClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-2xx status. `body` is the raw response body.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type,
    /// including a required field being absent.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("transport failed: {0}")]
    TransportError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Error envelope the Talos server uses for failed requests.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    /// The HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message from a JSON error body such as
    /// `{"error": "unauthorized", "code": 401, "message": "..."}`.
    ///
    /// Prefers `message` over `error`. Returns `None` for non-HTTP errors and
    /// for bodies that are not a JSON object with either field.
    pub fn server_message(&self) -> Option<String> {
        let ApiError::HttpError { body, .. } = self else {
            return None;
        };
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .message
            .filter(|m| !m.is_empty())
            .or(parsed.error.filter(|e| !e.is_empty()))
    }
}
