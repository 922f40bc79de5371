//! Error types for ProtoPRED client operations.
//!
//! Every variant carries the context needed to diagnose a failure without
//! re-deriving state: the attempted action, the HTTP status when there was
//! one, and the server's message when it sent one.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced by the ProtoPRED client.
#[derive(Debug, Error)]
pub enum ProtoPredError {
    /// Bad caller input, or a 4xx response other than 401/403.
    ///
    /// Local validation failures have no status and are raised before any
    /// network call.
    #[error("validation error{}: {message}", format_status(.status))]
    Validation {
        /// What was wrong.
        message: String,
        /// HTTP status when the server rejected the request.
        status: Option<u16>,
    },

    /// The server rejected the account credentials (HTTP 401 or 403).
    #[error("authentication failed (HTTP {status}): {message}\n  Suggestion: check account_token, account_secret_key and account_user")]
    Authentication {
        /// The HTTP status code (401 or 403).
        status: u16,
        /// Server message, or a generic description.
        message: String,
    },

    /// Connection-level failure (DNS, refused connection, TLS, reset).
    #[error("network error during {action} after {attempts} attempt(s): {source}")]
    Network {
        /// What the client was doing.
        action: String,
        /// Total attempts made, including the first.
        attempts: u32,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A request attempt exceeded the per-attempt timeout.
    #[error("timeout during {action} after {attempts} attempt(s) ({timeout:?} per attempt)")]
    Timeout {
        /// What the client was doing.
        action: String,
        /// Total attempts made, including the first.
        attempts: u32,
        /// The configured per-attempt timeout.
        timeout: Duration,
    },

    /// Server-side failure: 5xx, an `error` payload, or a malformed body.
    #[error("API error{}: {message}", format_status(.status))]
    Api {
        /// HTTP status, if the failure came with one.
        status: Option<u16>,
        /// Server message or parse-failure detail.
        message: String,
    },

    /// Local file could not be read or written.
    #[error("file error for {}: {reason}", .path.display())]
    File {
        /// Path involved.
        path: PathBuf,
        /// Human-readable description.
        reason: String,
        /// Underlying IO error, when there was one.
        #[source]
        source: Option<std::io::Error>,
    },
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ProtoPredError {
    /// Creates a local validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a validation error reported by the server.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates an authentication error.
    pub fn authentication(status: u16, message: impl Into<String>) -> Self {
        Self::Authentication {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(action: impl Into<String>, attempts: u32, source: reqwest::Error) -> Self {
        Self::Network {
            action: action.into(),
            attempts,
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(action: impl Into<String>, attempts: u32, timeout: Duration) -> Self {
        Self::Timeout {
            action: action.into(),
            attempts,
            timeout,
        }
    }

    /// Creates an API error.
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a file error wrapping an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a file error with no underlying IO error.
    pub fn file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. } | Self::Api { status, .. } => *status,
            Self::Authentication { status, .. } => Some(*status),
            Self::Network { .. } | Self::Timeout { .. } | Self::File { .. } => None,
        }
    }
}

// No From<reqwest::Error> or From<std::io::Error>: every variant needs
// context (action, attempts, path) the source error does not carry.
