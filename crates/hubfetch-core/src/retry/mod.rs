//! Transport-level retry and backoff policy.
//!
//! Classifies a failed HTTP transfer (timeouts, throttling, connection
//! failures) and decides whether to retry it after an exponential backoff.
//! This sits below the snapshot retry loop in [`crate::fetcher`]: one
//! snapshot attempt may issue many requests, each guarded by this policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::TransferError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
