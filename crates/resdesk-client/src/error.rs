use std::path::PathBuf;

use thiserror::Error;

/// Errors from one attempt at reading the reservation dataset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The payload decoded but is not a dataset envelope.
    #[error("invalid data format: {0}")]
    InvalidFormat(String),

    #[error("invalid data source '{source_str}': {reason}")]
    InvalidSource { source_str: String, reason: String },
}

/// Errors from asking the relay to draft a reply.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("rate limited: try again in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Connect failure, timeout, or a connection dropped mid-request.
    #[error("could not reach message service: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("message service returned a non-JSON response (content-type: {content_type})")]
    NonJsonResponse { content_type: String },

    #[error("message service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("message service reply is malformed: {0}")]
    MalformedReply(String),

    #[error("invalid relay URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ThreadStoreError {
    #[error("thread store I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file is not a JSON object; it is left untouched.
    #[error("thread store at {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode thread store: {0}")]
    Encode(#[from] serde_json::Error),
}
