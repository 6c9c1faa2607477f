//! Domain errors for the permission audit engine.

use permission_audit_sdk::RemoteError;
use thiserror::Error;

/// Internal domain errors.
///
/// Every variant is fatal for the run: the walker never skips a subtree on
/// error, it aborts.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("'{operation}' still throttled after {attempts} attempts")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
    },

    #[error("'{operation}' failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("report output failed: {0}")]
    Report(#[from] std::io::Error),
}

impl DomainError {
    pub fn remote(operation: &'static str, source: RemoteError) -> Self {
        Self::Remote { operation, source }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// The remote error behind this failure, if any.
    #[must_use]
    pub fn remote_source(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}
