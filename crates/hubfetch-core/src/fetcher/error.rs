//! Outcome of a single snapshot attempt, classified for the retry loop.

use thiserror::Error;

/// Coarse class of a failed snapshot attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Network, proxy, throttling, 5xx, short body, checksum mismatch.
    Transient,
    /// Repository, revision or file does not exist (HTTP 404).
    NotFound,
    /// Credentials missing or rejected (HTTP 401/403).
    Auth,
    /// Local filesystem failure or an unusable remote path.
    Storage,
}

/// A failed snapshot attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Transient(_) => FetchErrorKind::Transient,
            FetchError::NotFound(_) => FetchErrorKind::NotFound,
            FetchError::Auth(_) => FetchErrorKind::Auth,
            FetchError::Storage(_) => FetchErrorKind::Storage,
        }
    }

    /// True for failures that another attempt cannot fix without user action.
    /// Storage errors are left retryable: a full disk may be cleaned up meanwhile.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self.kind(),
            FetchErrorKind::NotFound | FetchErrorKind::Auth
        )
    }
}
