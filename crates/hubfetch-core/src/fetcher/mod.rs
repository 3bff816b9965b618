//! Retry-guarded snapshot fetcher.
//!
//! Calls a [`SnapshotFetcher`] until it succeeds or the retry budget is
//! spent, sleeping with exponential backoff between attempts. The loop is
//! sequential and blocking; sleeping and reporting go through small traits so
//! callers (and tests) control time and output.

mod backoff;
mod error;
mod run;

pub use backoff::Backoff;
pub use error::{FetchError, FetchErrorKind};
pub use run::run;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// What to fetch and how hard to try. Built once at startup.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Hub identifier, e.g. `org/name`.
    pub target: String,
    /// Materialized output directory; also used as the cache directory.
    pub destination: PathBuf,
    /// Retries allowed after the first failure.
    pub max_retries: u32,
    /// Stop on not-found/auth errors instead of spending the retry budget.
    pub fail_fast: bool,
    pub backoff: Backoff,
}

/// Options passed to every snapshot attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Download files again even if they are already present locally.
    pub force_download: bool,
    /// Continue partial downloads left by earlier attempts.
    pub resume: bool,
    /// Directory the files are written into.
    pub local_dir: PathBuf,
    /// Directory for partial downloads and metadata.
    pub cache_dir: PathBuf,
}

impl SnapshotOptions {
    /// Force re-download with resume, writing into `dir` and caching under it.
    pub fn forced_into(dir: PathBuf) -> Self {
        Self {
            force_download: true,
            resume: true,
            cache_dir: dir.clone(),
            local_dir: dir,
        }
    }
}

/// One snapshot download attempt.
pub trait SnapshotFetcher {
    /// Download every file of `target` into `opts.local_dir`.
    /// Returns the directory holding the snapshot.
    fn fetch_snapshot(&mut self, target: &str, opts: &SnapshotOptions)
        -> Result<PathBuf, FetchError>;
}

/// Blocking delay between attempts.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Receives progress of the retry loop (console output in the CLI).
pub trait RetryObserver {
    /// An attempt failed and another will follow after `sleep`.
    fn on_retry(&mut self, failed: u32, max_retries: u32, sleep: Duration, error: &FetchError) {
        let _ = (failed, max_retries, sleep, error);
    }

    /// The snapshot completed.
    fn on_success(&mut self, failed: u32, elapsed: Duration) {
        let _ = (failed, elapsed);
    }

    /// No further attempts will be made.
    fn on_give_up(&mut self, failed: u32, error: &FetchError) {
        let _ = (failed, error);
    }
}

/// Observer that only logs through `tracing` (the loop logs anyway).
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RetryObserver for SilentObserver {}

/// Final state of the retry loop.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A snapshot attempt succeeded after `failed` failures.
    Success {
        failed: u32,
        elapsed: Duration,
        location: PathBuf,
    },
    /// Every attempt failed; `failed` is `max_retries + 1`.
    Exhausted { failed: u32, last_error: FetchError },
    /// Stopped early on a permanent error (fail-fast).
    Aborted { failed: u32, error: FetchError },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn failed(&self) -> u32 {
        match self {
            FetchOutcome::Success { failed, .. }
            | FetchOutcome::Exhausted { failed, .. }
            | FetchOutcome::Aborted { failed, .. } => *failed,
        }
    }

    /// 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
