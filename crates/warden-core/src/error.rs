//! Error types for the warden application.

use thiserror::Error;
use warden_types::ConnectFailure;

/// A shared error type for the entire warden application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone)]
pub enum WardenError {
    /// Authentication was rejected by the network. Not retried.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The network is throttling this account. Not retried, the operator
    /// must wait.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Transient connectivity failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The session transport misbehaved (closed streams, rejected calls).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The operator-facing guard code prompt failed or was cancelled.
    #[error("Guard code prompt failed: {0}")]
    Prompt(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    /// Creates an Authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Prompt error
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error should stop the session permanently.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::RateLimited(_))
    }

    /// Check if this error is a transient network failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WardenError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for WardenError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ConnectFailure> for WardenError {
    fn from(failure: ConnectFailure) -> Self {
        match failure {
            ConnectFailure::InvalidCredentials => {
                Self::Authentication("invalid account name or password".to_string())
            }
            ConnectFailure::RateLimited => Self::RateLimited(
                "too many login attempts, wait before trying again".to_string(),
            ),
            ConnectFailure::NetworkUnreachable => {
                Self::Network("the network is unreachable".to_string())
            }
            ConnectFailure::Unknown(message) => Self::Transport(message),
        }
    }
}

/// A type alias for `Result<T, WardenError>`.
pub type Result<T> = std::result::Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(WardenError::authentication("bad password").is_fatal());
        assert!(WardenError::RateLimited("slow down".into()).is_fatal());
        assert!(!WardenError::network("offline").is_fatal());
        assert!(!WardenError::config("missing file").is_fatal());
    }

    #[test]
    fn test_connect_failure_conversion() {
        let err: WardenError = ConnectFailure::InvalidCredentials.into();
        assert!(err.is_fatal());

        let err: WardenError = ConnectFailure::NetworkUnreachable.into();
        assert!(err.is_transient());

        let err: WardenError = ConnectFailure::Unknown("handshake rejected".into()).into();
        assert!(matches!(err, WardenError::Transport(_)));
    }
}
