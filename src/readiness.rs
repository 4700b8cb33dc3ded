use crate::{Error, Result, clock::Clock, config::ReadinessConfig};
use reqwest::StatusCode;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Blocks until the WebUI answers its health-check URL with 200.
///
/// Network errors are swallowed and retried. Every `log_every`-th failure is
/// logged so a slow cold start does not flood the output. With no
/// `max_attempts` the wait has no upper bound.
pub struct ReadinessGate {
    http: reqwest::Client,
    url: String,
    interval: Duration,
    request_timeout: Duration,
    log_every: u32,
    max_attempts: Option<u32>,
    clock: Arc<dyn Clock>,
}

/// True on every `log_every`-th consecutive network failure.
fn should_log_failure(failures: u32, log_every: u32) -> bool {
    failures % log_every.max(1) == 0
}

impl ReadinessGate {
    pub fn new(url: impl Into<String>, config: &ReadinessConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            interval: Duration::from_millis(config.interval_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            log_every: config.log_every.max(1),
            max_attempts: config.max_attempts,
            clock,
        }
    }

    /// Returns the number of attempts it took.
    pub async fn wait(&self) -> Result<u32> {
        let mut attempts = 0;
        let mut failures = 0;

        loop {
            attempts += 1;

            match self
                .http
                .get(&self.url)
                .timeout(self.request_timeout)
                .send()
                .await
            {
                Ok(response) if response.status() == StatusCode::OK => {
                    info!("Service at {} is ready after {} attempts", self.url, attempts);
                    return Ok(attempts);
                }
                Ok(response) => {
                    debug!("Service at {} answered {}", self.url, response.status());
                }
                Err(e) => {
                    failures += 1;
                    if should_log_failure(failures, self.log_every) {
                        info!("Service not ready yet. Retrying... ({})", e);
                    }
                }
            }

            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Err(Error::NotReady { attempts });
                }
            }

            self.clock.sleep(self.interval).await;
        }
    }
}
