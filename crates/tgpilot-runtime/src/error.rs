//! Error types for the runtime crate.

use std::time::Duration;

use thiserror::Error;
use tgpilot_protocol::ProtocolError;

/// Errors that abort a workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Missing or malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No authenticated session for the key.
    #[error("not connected")]
    NotConnected,

    /// The login code was rejected.
    #[error("invalid verification code")]
    InvalidCode,

    /// The second-factor password was rejected.
    #[error("invalid two-step verification password")]
    InvalidPassword,

    /// The protocol connection could not be opened.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// A remote call exceeded the configured bound.
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// Any other protocol failure.
    #[error("upstream failure: {0}")]
    Upstream(ProtocolError),
}

impl From<ProtocolError> for WorkflowError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidCode => WorkflowError::InvalidCode,
            ProtocolError::InvalidPassword => WorkflowError::InvalidPassword,
            ProtocolError::NotAuthorized => WorkflowError::NotConnected,
            ProtocolError::ConnectFailed(reason) => WorkflowError::ConnectFailed(reason),
            other => WorkflowError::Upstream(other),
        }
    }
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_mapping() {
        assert!(matches!(
            WorkflowError::from(ProtocolError::InvalidCode),
            WorkflowError::InvalidCode
        ));
        assert!(matches!(
            WorkflowError::from(ProtocolError::NotAuthorized),
            WorkflowError::NotConnected
        ));
        assert!(matches!(
            WorkflowError::from(ProtocolError::FloodWait { seconds: 3 }),
            WorkflowError::Upstream(ProtocolError::FloodWait { seconds: 3 })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = WorkflowError::InvalidInput("keywords must not be empty".into());
        assert_eq!(err.to_string(), "invalid input: keywords must not be empty");
    }
}
