use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default hub base URL.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Backoff between whole-snapshot attempts (the outer retry loop).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackoffConfig {
    /// Growth factor per failed attempt; the delay is `factor ^ failed` seconds.
    pub factor: f64,
    /// Upper bound on a single sleep, in seconds.
    pub max_delay_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            factor: 1.5,
            max_delay_secs: 45,
        }
    }
}

/// Per-request retry parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportRetryConfig {
    /// Maximum number of attempts per HTTP request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 1.0 = 1s).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for TransportRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/hubfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubfetchConfig {
    /// Hub base URL, e.g. a mirror. Overridden by `--endpoint` / `HF_ENDPOINT`.
    pub endpoint: String,
    /// Connect timeout for each HTTP request, in seconds.
    pub connect_timeout_secs: u64,
    /// Verify SHA-256 of LFS files after download when the listing provides one.
    pub verify_checksums: bool,
    /// Stop immediately on not-found and auth errors instead of retrying.
    #[serde(default)]
    pub fail_fast: bool,
    /// Backoff between snapshot attempts.
    #[serde(default)]
    pub backoff: BackoffConfig,
    /// Optional per-request retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub transport_retry: Option<TransportRetryConfig>,
}

impl Default for HubfetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout_secs: 30,
            verify_checksums: true,
            fail_fast: false,
            backoff: BackoffConfig::default(),
            transport_retry: None,
        }
    }
}

impl HubfetchConfig {
    /// Reject values that would make the backoff curve meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff.factor.is_finite() || self.backoff.factor < 1.0 {
            anyhow::bail!(
                "backoff.factor must be a finite number >= 1.0, got {}",
                self.backoff.factor
            );
        }
        if self.endpoint.trim().is_empty() {
            anyhow::bail!("endpoint must not be empty");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hubfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
///
/// An unusable config directory is not fatal: defaults are used instead.
pub fn load_or_init() -> Result<HubfetchConfig> {
    match config_path() {
        Ok(path) => load_or_init_at(&path),
        Err(e) => {
            tracing::warn!("config dir unavailable, using defaults: {:#}", e);
            Ok(HubfetchConfig::default())
        }
    }
}

/// Like [`load_or_init`] but for an explicit path.
///
/// A file that exists but does not parse or validate is an error. Failing to
/// write the default file only logs a warning.
pub fn load_or_init_at(path: &Path) -> Result<HubfetchConfig> {
    if !path.exists() {
        let default_cfg = HubfetchConfig::default();
        match write_default(path, &default_cfg) {
            Ok(()) => tracing::info!("created default config at {}", path.display()),
            Err(e) => tracing::warn!("using default config: {:#}", e),
        }
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HubfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn write_default(path: &Path, cfg: &HubfetchConfig) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
