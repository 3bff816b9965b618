//! Single-transfer error type for retry classification.

use std::fmt;

/// Error returned by a single HTTP transfer (curl failure, HTTP status, or local write).
/// Kept separate from anyhow so the retry policy and the hub error mapping can inspect it.
#[derive(Debug)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, proxy, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Transfer completed but the body was shorter than announced
    /// (e.g. server or proxy closed early).
    PartialTransfer { expected: u64, received: u64 },
    /// Local write failed (disk full, permission denied). Not retried.
    Storage(std::io::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Curl(e) => write!(f, "{}", e),
            TransferError::Http(code) => write!(f, "HTTP {}", code),
            TransferError::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            TransferError::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Curl(e) => Some(e),
            TransferError::Storage(e) => Some(e),
            TransferError::Http(_) | TransferError::PartialTransfer { .. } => None,
        }
    }
}

impl From<curl::Error> for TransferError {
    fn from(e: curl::Error) -> Self {
        TransferError::Curl(e)
    }
}

impl From<std::io::Error> for TransferError {
    fn from(e: std::io::Error) -> Self {
        TransferError::Storage(e)
    }
}
