//! Error types for the remote content service.

use thiserror::Error;

/// Errors returned by a [`ContentClient`](crate::ContentClient).
///
/// Only [`RemoteError::Throttled`] is transient. Every other variant is
/// treated as fatal by the audit engine and aborts the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote service asked the caller to slow down (HTTP 429 / 503).
    #[error("request throttled by remote service")]
    Throttled,

    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The session is not allowed to read the requested object.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other failure reported by the remote service.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RemoteError {
    /// Whether this error is the transient rate-limit class.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled)
    }

    /// Classify an HTTP status returned by the remote service.
    ///
    /// For HTTP-backed `ContentClient` implementations; the in-memory plugin
    /// raises `RemoteError` variants directly. 503 ("server too busy")
    /// belongs to the throttled class.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            429 | 503 => Self::Throttled,
            404 => Self::NotFound(message.into()),
            401 | 403 => Self::AccessDenied(message.into()),
            _ => Self::Internal(format!("HTTP {status}: {}", message.into())),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn throttling_statuses_are_transient() {
        assert!(RemoteError::from_status(429, "slow down").is_throttled());
        assert!(RemoteError::from_status(503, "busy").is_throttled());
    }

    #[test]
    fn other_statuses_are_fatal() {
        assert_eq!(
            RemoteError::from_status(404, "/sites/x"),
            RemoteError::NotFound("/sites/x".to_owned())
        );
        assert_eq!(
            RemoteError::from_status(403, "nope"),
            RemoteError::AccessDenied("nope".to_owned())
        );
        let err = RemoteError::from_status(500, "boom");
        assert!(!err.is_throttled());
        assert_eq!(err.to_string(), "internal error: HTTP 500: boom");
    }
}
