//! Shared error type across servwatch crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed document.
    BadRequest,
    /// Identifier is not a well-formed server id.
    InvalidId,
    /// Entity absent from the store.
    NotFound,
    /// Store operation exceeded its deadline.
    Timeout,
    /// Store unreachable or shutting down.
    Unavailable,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InvalidId => "INVALID_ID",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ServWatchError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum ServWatchError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid server id: {0}")]
    InvalidId(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store operation timed out")]
    Timeout,
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ServWatchError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ServWatchError::BadRequest(_) => ClientCode::BadRequest,
            ServWatchError::InvalidId(_) => ClientCode::InvalidId,
            ServWatchError::NotFound(_) => ClientCode::NotFound,
            ServWatchError::Timeout => ClientCode::Timeout,
            ServWatchError::Unavailable(_) => ClientCode::Unavailable,
            ServWatchError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ServWatchError::Internal(_) => ClientCode::Internal,
        }
    }
}
