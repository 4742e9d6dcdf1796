//! Drover Common Error Types
//!
//! Centralized error handling for all Drover components. The variants
//! follow the runtime's error taxonomy: configuration problems,
//! pre-dispatch validation rejections, provider/transient failures, and
//! lookup failures for unknown connections or actions.

use std::fmt;

/// Main error type for Drover operations
#[derive(Debug)]
pub enum DroverError {
    /// Generic error with message
    Generic(String),
    /// IO-related errors
    Io(std::io::Error),
    /// Serialization/deserialization errors
    Serde(serde_json::Error),
    /// Agent profile could not be loaded or is malformed
    Profile(String),
    /// A provider's credentials/config are missing or invalid
    Config(String),
    /// Caller supplied malformed/missing action arguments; one message
    /// per offending parameter, never sent to the provider
    Validation(Vec<String>),
    /// The underlying provider call failed (timeout, rate limit, API error)
    Provider {
        connection: String,
        message: String,
    },
    /// No connection registered under this name
    UnknownConnection(String),
    /// The connection exists but does not expose this action
    UnknownAction {
        connection: String,
        action: String,
    },
    /// The connection exists but its credentials are not set up
    NotConfigured(String),
}

impl fmt::Display for DroverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroverError::Generic(msg) => write!(f, "Drover error: {}", msg),
            DroverError::Io(err) => write!(f, "IO error: {}", err),
            DroverError::Serde(err) => write!(f, "Serialization error: {}", err),
            DroverError::Profile(msg) => write!(f, "Agent profile error: {}", msg),
            DroverError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DroverError::Validation(issues) => {
                write!(f, "Invalid action arguments: {}", issues.join("; "))
            }
            DroverError::Provider {
                connection,
                message,
            } => write!(f, "Provider error from '{}': {}", connection, message),
            DroverError::UnknownConnection(name) => write!(
                f,
                "Unknown connection '{}'. Use list-connections to see all supported connections",
                name
            ),
            DroverError::UnknownAction {
                connection,
                action,
            } => write!(
                f,
                "Unknown action '{}' on connection '{}'. Use list-actions to see what it supports",
                action, connection
            ),
            DroverError::NotConfigured(name) => write!(
                f,
                "Connection '{}' is not configured. Run configure to set up its credentials",
                name
            ),
        }
    }
}

impl std::error::Error for DroverError {}

/// Convenience result type for Drover operations
pub type Result<T> = std::result::Result<T, DroverError>;

// Implement From traits for common error types
impl From<std::io::Error> for DroverError {
    fn from(err: std::io::Error) -> Self {
        DroverError::Io(err)
    }
}

impl From<serde_json::Error> for DroverError {
    fn from(err: serde_json::Error) -> Self {
        DroverError::Serde(err)
    }
}

impl From<anyhow::Error> for DroverError {
    fn from(err: anyhow::Error) -> Self {
        DroverError::Generic(err.to_string())
    }
}

impl DroverError {
    /// True for failures that originate outside the runtime and are
    /// worth retrying on a later iteration
    pub fn is_transient(&self) -> bool {
        matches!(self, DroverError::Provider { .. } | DroverError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_lists_every_issue() {
        let err = DroverError::Validation(vec![
            "missing required parameter: prompt".to_string(),
            "parameter 'count' expects an integer".to_string(),
        ]);
        let text = err.to_string();
        assert!(text.contains("prompt"));
        assert!(text.contains("count"));
    }

    #[test]
    fn unknown_connection_points_at_remediation() {
        let err = DroverError::UnknownConnection("twitterr".to_string());
        assert!(err.to_string().contains("list-connections"));
    }

    #[test]
    fn transient_classification() {
        assert!(
            DroverError::Provider {
                connection: "openai".to_string(),
                message: "rate limited".to_string(),
            }
            .is_transient()
        );
        assert!(!DroverError::Validation(vec![]).is_transient());
        assert!(!DroverError::NotConfigured("openai".to_string()).is_transient());
    }
}
