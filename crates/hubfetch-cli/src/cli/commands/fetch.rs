//! Fetch command: download the snapshot with retries and report on stdout.

use crate::cli::Cli;
use anyhow::{Context, Result};
use hubfetch_core::config::HubfetchConfig;
use hubfetch_core::fetcher::{
    self, Backoff, FetchError, FetchRequest, RetryObserver, ThreadSleeper,
};
use hubfetch_core::hub::{HubClient, HubClientConfig, HubSnapshotFetcher};
use hubfetch_core::proxy::{self, ProxyConfig};
use hubfetch_core::retry::RetryPolicy;
use std::process::ExitCode;
use std::time::Duration;

/// Prints loop progress in the same shape as earlier versions of the tool.
struct ConsoleObserver;

impl RetryObserver for ConsoleObserver {
    fn on_retry(&mut self, failed: u32, max_retries: u32, sleep: Duration, error: &FetchError) {
        tracing::debug!("attempt {} failed: {}", failed, error);
        println!(
            "failed, fail/max_retry = {}/{}, sleeping {}",
            failed,
            max_retries,
            sleep.as_secs()
        );
    }

    fn on_success(&mut self, failed: u32, elapsed: Duration) {
        println!(
            "download, done! failed = {}, time_cost = {:.1} seconds",
            failed,
            elapsed.as_secs_f64()
        );
    }

    fn on_give_up(&mut self, _failed: u32, error: &FetchError) {
        println!("failed!");
        eprintln!("last error: {}", error);
    }
}

/// Builds the hub client settings from flags, falling back to the config file.
pub(crate) fn client_config(
    cli: &Cli,
    cfg: &HubfetchConfig,
    proxy: Option<ProxyConfig>,
) -> HubClientConfig {
    let retry = cfg
        .transport_retry
        .as_ref()
        .map(RetryPolicy::from)
        .unwrap_or_default();
    HubClientConfig {
        endpoint: cli
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| cfg.endpoint.clone()),
        proxy,
        token: cli.token.clone(),
        connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
        retry,
        ..HubClientConfig::default()
    }
}

pub(crate) fn fetch_request(cli: &Cli, cfg: &HubfetchConfig) -> FetchRequest {
    FetchRequest {
        target: cli.model.clone(),
        destination: cli.path.clone(),
        max_retries: cli.max_retry,
        fail_fast: cli.fail_fast || cfg.fail_fast,
        backoff: Backoff::from(&cfg.backoff),
    }
}

/// Resolve the proxy, build the client, and run the retry loop.
pub fn run_fetch(cli: &Cli, cfg: &HubfetchConfig) -> Result<ExitCode> {
    let proxy = proxy::resolve_proxy_from_env(cli.proxy, &cli.proxy_addr);
    let addr = proxy
        .as_ref()
        .map(|p| p.http.as_str())
        .unwrap_or(cli.proxy_addr.as_str());
    println!("proxy = {}, addr = {}", cli.proxy, addr);
    if let Some(p) = &proxy {
        println!("enable proxy, addr = {}", p.http);
    }

    let client = HubClient::new(client_config(cli, cfg, proxy)).context("hub client setup")?;
    let mut hub = HubSnapshotFetcher::new(client, cli.repo_type, cli.revision.clone())
        .with_checksums(cfg.verify_checksums);
    let request = fetch_request(cli, cfg);
    tracing::info!(
        repo = %request.target,
        max_retries = request.max_retries,
        fail_fast = request.fail_fast,
        "starting fetch into {}",
        request.destination.display()
    );

    let outcome = fetcher::run(&request, &mut hub, &mut ThreadSleeper, &mut ConsoleObserver);
    let stats = hub.last_stats();
    tracing::info!(
        files = stats.files,
        downloaded = stats.downloaded,
        skipped = stats.skipped,
        bytes = stats.bytes,
        success = outcome.is_success(),
        "fetch finished after {} failed attempts",
        outcome.failed()
    );
    Ok(outcome.exit_code())
}
