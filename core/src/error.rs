//! Error types for the board API client and the preference store.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently tell
//! "the post or comment is gone" apart from every other failure. All other
//! non-2xx responses land in `Http` with the raw status and body; the client
//! never interprets the server's error payload.

use thiserror::Error;

/// Errors returned by `BoardClient` and `BoardApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The list-posts query string could not be encoded.
    #[error("query encoding failed: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),

    /// The request never produced a response (connection refused, DNS, I/O).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by a `Storage` backend.
///
/// `PreferenceStore` never surfaces these; they exist so backends can report
/// what went wrong and the store can log it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No persistent storage exists in this execution context.
    #[error("persistent storage is unavailable")]
    Unavailable,

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but does not hold a JSON object of strings.
    #[error("storage contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Any other backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}
