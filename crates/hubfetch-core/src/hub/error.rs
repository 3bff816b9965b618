//! Maps transfer failures onto snapshot error kinds.

use crate::fetcher::FetchError;
use crate::retry::TransferError;
use std::path::Path;

/// 404 is not-found, 401/403 is auth, local writes are storage; the rest is transient.
pub(crate) fn transfer_to_fetch_error(context: &str, e: TransferError) -> FetchError {
    let msg = format!("{}: {}", context, e);
    match e {
        TransferError::Http(404) => FetchError::NotFound(msg),
        TransferError::Http(401) | TransferError::Http(403) => FetchError::Auth(msg),
        TransferError::Storage(_) => FetchError::Storage(msg),
        TransferError::Curl(_) | TransferError::Http(_) | TransferError::PartialTransfer { .. } => {
            FetchError::Transient(msg)
        }
    }
}

pub(crate) fn io_to_fetch_error(path: &Path, e: std::io::Error) -> FetchError {
    FetchError::Storage(format!("{}: {}", path.display(), e))
}
