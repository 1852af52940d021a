//! Core error types for arise-core.
//!
//! `LedgerError` is the taxonomy every remote call is classified into; the
//! challenge controller converts it into a rollback plus a surfaced message.
//! The remaining types cover local concerns (configuration, credentials).

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a call to the remote progression ledger.
///
/// Cloneable so the controller can both keep the last error and hand a copy
/// to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Network failure or a 5xx reply.
    #[error("Ledger unreachable: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// The ledger rejected the request as semantically invalid.
    #[error("{message}")]
    Validation { status: u16, message: String },

    /// Credential missing or rejected.
    #[error("Not authenticated with the ledger")]
    Unauthorized,

    /// The reply did not satisfy local invariants.
    #[error("Malformed ledger payload: {0}")]
    Malformed(String),

    /// The configured base URL cannot address an endpoint.
    #[error("Invalid ledger URL: {0}")]
    InvalidUrl(String),
}

/// Coarse classification used in events and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerErrorKind {
    Transport,
    Validation,
    Unauthorized,
    Malformed,
    InvalidUrl,
}

impl LedgerError {
    pub fn transport(message: impl Into<String>) -> Self {
        LedgerError::Transport {
            message: message.into(),
            status: None,
        }
    }

    pub fn kind(&self) -> LedgerErrorKind {
        match self {
            LedgerError::Transport { .. } => LedgerErrorKind::Transport,
            LedgerError::Validation { .. } => LedgerErrorKind::Validation,
            LedgerError::Unauthorized => LedgerErrorKind::Unauthorized,
            LedgerError::Malformed(_) => LedgerErrorKind::Malformed,
            LedgerError::InvalidUrl(_) => LedgerErrorKind::InvalidUrl,
        }
    }

    /// Whether re-issuing the same request by hand can succeed.
    ///
    /// Resolution calls are never retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Transport { .. } | LedgerError::Unauthorized
        )
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return LedgerError::Malformed(err.to_string());
        }
        LedgerError::Transport {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<url::ParseError> for LedgerError {
    fn from(err: url::ParseError) -> Self {
        LedgerError::InvalidUrl(err.to_string())
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Credential storage errors.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Credential must not be empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_auth_errors_are_retryable() {
        assert!(LedgerError::transport("connection refused").is_retryable());
        assert!(LedgerError::Unauthorized.is_retryable());
        assert!(!LedgerError::Malformed("bad".into()).is_retryable());
        assert!(!LedgerError::Validation {
            status: 400,
            message: "Misión ya completada".into()
        }
        .is_retryable());
    }

    #[test]
    fn validation_error_displays_ledger_message() {
        let err = LedgerError::Validation {
            status: 400,
            message: "Quest already completed".into(),
        };
        assert_eq!(err.to_string(), "Quest already completed");
        assert_eq!(err.kind(), LedgerErrorKind::Validation);
    }
}
