use super::{
    FetchOutcome, FetchRequest, RetryObserver, Sleeper, SnapshotFetcher, SnapshotOptions,
};
use std::time::Instant;

/// Runs snapshot attempts until one succeeds or `max_retries` failures have
/// been retried. Every failure kind is retried unless `fail_fast` is set, in
/// which case not-found and auth failures end the loop at once.
///
/// No sleep follows the last failed attempt.
pub fn run(
    request: &FetchRequest,
    fetcher: &mut dyn SnapshotFetcher,
    sleeper: &mut dyn Sleeper,
    observer: &mut dyn RetryObserver,
) -> FetchOutcome {
    let opts = SnapshotOptions::forced_into(request.destination.clone());
    let mut failed = 0u32;
    let start = Instant::now();

    loop {
        tracing::info!(
            repo = %request.target,
            attempt = failed + 1,
            "fetching snapshot into {}",
            opts.local_dir.display()
        );
        let error = match fetcher.fetch_snapshot(&request.target, &opts) {
            Ok(location) => {
                let elapsed = start.elapsed();
                tracing::info!(
                    failed,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "snapshot complete at {}",
                    location.display()
                );
                observer.on_success(failed, elapsed);
                return FetchOutcome::Success {
                    failed,
                    elapsed,
                    location,
                };
            }
            Err(e) => e,
        };

        failed = failed.saturating_add(1);
        tracing::warn!(failed, kind = ?error.kind(), "snapshot attempt failed: {}", error);

        if request.fail_fast && error.is_permanent() {
            tracing::error!("permanent failure, not retrying: {}", error);
            observer.on_give_up(failed, &error);
            return FetchOutcome::Aborted { failed, error };
        }
        if failed > request.max_retries {
            tracing::error!(failed, "retry budget exhausted");
            observer.on_give_up(failed, &error);
            return FetchOutcome::Exhausted {
                failed,
                last_error: error,
            };
        }

        let delay = request.backoff.delay(failed);
        observer.on_retry(failed, request.max_retries, delay, &error);
        sleeper.sleep(delay);
    }
}
