//! Status-based retry policy for calls to the local WebUI.
//!
//! Only gateway-style statuses are retried. Connection errors and timeouts are
//! never retried here; they surface to the caller on the first occurrence.

use crate::config::RetryConfig;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of retries (not including the initial attempt).
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
    pub status_forcelist: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        let status_forcelist = config
            .status_forcelist
            .iter()
            .filter_map(|code| StatusCode::from_u16(*code).ok())
            .collect();

        Self {
            max_retries: config.max_retries,
            backoff_factor: Duration::from_millis(config.backoff_factor_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            status_forcelist,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Delay before the `retry`-th retry (1-based).
    ///
    /// The first retry goes out immediately; after that the delay doubles
    /// from `2 * backoff_factor`, capped at `max_backoff`.
    pub fn backoff_duration(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(31);
        let backoff = self.backoff_factor.as_millis() as f64 * 2f64.powi(exponent as i32);
        let backoff_ms = backoff.min(self.max_backoff.as_millis() as f64) as u64;
        Duration::from_millis(backoff_ms)
    }
}
