//! Protocol error types.

use thiserror::Error;

/// Errors reported by a protocol client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The transport could not establish a session.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// The login code was rejected.
    #[error("invalid verification code")]
    InvalidCode,

    /// The account has a second-factor password and it was not supplied.
    #[error("two-step verification password required")]
    PasswordRequired,

    /// The second-factor password was rejected.
    #[error("invalid two-step verification password")]
    InvalidPassword,

    /// The call needs an authorized account.
    #[error("not authorized")]
    NotAuthorized,

    /// A username or peer could not be resolved.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform asked us to back off.
    #[error("flood wait: retry after {seconds}s")]
    FloodWait {
        /// Seconds to wait before retrying.
        seconds: u32,
    },

    /// Any other RPC failure.
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
