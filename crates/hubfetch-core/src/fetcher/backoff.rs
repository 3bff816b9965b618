//! Delay between whole-snapshot attempts.

use crate::config::BackoffConfig;
use std::time::Duration;

/// Exponential backoff `floor(min(factor ^ failed, max))` in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub factor: f64,
    pub max_delay_secs: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from(&BackoffConfig::default())
    }
}

impl From<&BackoffConfig> for Backoff {
    fn from(cfg: &BackoffConfig) -> Self {
        Self {
            factor: cfg.factor,
            max_delay_secs: cfg.max_delay_secs,
        }
    }
}

impl Backoff {
    /// Seconds to sleep after the `failed`-th failure (1-based).
    pub fn sleep_seconds(&self, failed: u32) -> u64 {
        let exp = i32::try_from(failed).unwrap_or(i32::MAX);
        let raw = self.factor.powi(exp);
        let capped = raw.min(self.max_delay_secs as f64);
        if capped.is_nan() || capped <= 0.0 {
            return 0;
        }
        capped.floor() as u64
    }

    pub fn delay(&self, failed: u32) -> Duration {
        Duration::from_secs(self.sleep_seconds(failed))
    }
}
