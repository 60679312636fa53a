//! Error types for banter.

use thiserror::Error;

/// Result type alias using the banter error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the conversation core.
#[derive(Error, Debug)]
pub enum Error {
    /// The remote completion request failed. Carries the provider detail
    /// unmodified; the core never retries or swallows this.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A stored blob failed to parse back into a conversation.
    #[error("malformed record for conversation '{name}': {source}")]
    MalformedRecord {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Underlying SQLite error from the conversation store.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error from the remote completion service.
///
/// Wraps whatever the transport or provider reported. The core forwards
/// these to the caller without interpreting them further.
#[derive(Error, Debug)]
#[error("completion request failed{}: {message}", status_display(.status_code))]
pub struct RemoteError {
    /// Human-readable provider or transport detail.
    pub message: String,
    /// HTTP status, when the failure came from an HTTP response.
    pub status_code: Option<u16>,
}

impl RemoteError {
    /// Build a transport-level error (no HTTP status).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
        }
    }

    /// Build an error from an HTTP error response.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: Some(code),
        }
    }
}

fn status_display(status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!(" ({code})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_with_status() {
        let err = RemoteError::status(429, "rate limited");
        assert_eq!(
            err.to_string(),
            "completion request failed (429): rate limited"
        );
    }

    #[test]
    fn remote_error_display_without_status() {
        let err = RemoteError::transport("connection refused");
        assert_eq!(
            err.to_string(),
            "completion request failed: connection refused"
        );
    }

    #[test]
    fn remote_error_converts_to_core_error() {
        let err: Error = RemoteError::transport("dns failure").into();
        assert!(matches!(err, Error::Remote(_)));
    }
}
