//! CLI for hubfetch.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser};
use hubfetch_core::config;
use hubfetch_core::hub::RepoType;
use hubfetch_core::proxy::{parse_proxy_flag, DEFAULT_PROXY_ADDR};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::run_fetch;

/// Repository fetched when `--model` is not given.
pub const DEFAULT_MODEL: &str = "russwang/ThinkLite-VL-70k";

/// Download a hub dataset or model snapshot, retrying with exponential backoff.
#[derive(Debug, Parser)]
#[command(name = "hubfetch", version)]
#[command(about = "Download a hub snapshot, retrying with exponential backoff", long_about = None)]
pub struct Cli {
    /// Name of the hub repository to download.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Directory the snapshot is written into (also holds partial downloads).
    #[arg(long, default_value = "./", value_name = "DIR")]
    pub path: PathBuf,

    /// Max retries for downloading after the first failure.
    #[arg(long = "max_retry", default_value_t = 10, value_name = "N")]
    pub max_retry: u32,

    /// Whether to enable the proxy; any value containing "y" enables it.
    ///
    /// The proxy applies to this process only: `http_proxy`/`https_proxy`
    /// are not exported to the environment.
    #[arg(
        long,
        action = ArgAction::Set,
        value_parser = parse_proxy_value,
        default_value = "false",
        value_name = "BOOL"
    )]
    pub proxy: bool,

    /// Proxy address; the `http_proxy` environment variable wins when set.
    #[arg(long = "proxy_addr", default_value = DEFAULT_PROXY_ADDR, value_name = "URL")]
    pub proxy_addr: String,

    /// Repository type: model, dataset or space.
    #[arg(long = "repo_type", default_value = "dataset", value_name = "TYPE")]
    pub repo_type: RepoType,

    /// Branch, tag or commit to download.
    #[arg(long, default_value = "main")]
    pub revision: String,

    /// Access token for private or gated repositories.
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Hub base URL (defaults to the configured endpoint).
    #[arg(long, env = "HF_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Stop at once when the repository is missing or access is denied.
    #[arg(long = "fail_fast")]
    pub fail_fast: bool,
}

fn parse_proxy_value(value: &str) -> Result<bool, String> {
    Ok(parse_proxy_flag(value))
}

impl Cli {
    pub fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        run_fetch(&cli, &cfg)
    }
}

#[cfg(test)]
mod tests;
