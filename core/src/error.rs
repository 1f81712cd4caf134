//! Error types for the Taman Kehati API client.
//!
//! # Design
//! A response that arrived with a non-2xx status is the only structured
//! failure: `Http` carries the status code and the decoded body. Failures
//! where no response was received surface as `Transport` with no status.
//! The client never recovers locally; every variant reaches the caller.

use std::fmt;

use serde_json::Value;

/// Decoded body of an error response: JSON when the server declared it,
/// raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{value}"),
            ResponseBody::Text(text) => f.write_str(text),
        }
    }
}

/// Errors returned by `KehatiClient` and `ApiClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a status outside 200..300.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: ResponseBody },

    /// No response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Status code of an `Http` error; `None` for local and transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
