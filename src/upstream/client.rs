use super::retry::RetryPolicy;
use super::types::*;
use crate::{
    Error, Result,
    clock::Clock,
    config::{TimeoutsConfig, UpstreamConfig},
};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Status and body of a finished upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn into_error(self) -> Error {
        Error::Upstream {
            status: self.status.as_u16(),
            body: self.body,
        }
    }
}

/// HTTP client for the local WebUI.
///
/// Owns one keep-alive pool for the lifetime of the process. Every call goes
/// through the status-based [`RetryPolicy`].
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_prefix: String,
    face_swap_path: String,
    timeouts: TimeoutsConfig,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_prefix: config.api_prefix.trim_end_matches('/').to_string(),
            face_swap_path: config.face_swap_path.clone(),
            timeouts: config.timeouts.clone(),
            retry: RetryPolicy::from_config(&config.retry),
            clock,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            self.api_prefix,
            endpoint.trim_start_matches('/')
        )
    }

    pub fn face_swap_url(&self) -> String {
        format!("{}{}", self.base_url, self.face_swap_path)
    }

    pub fn timeouts(&self) -> &TimeoutsConfig {
        &self.timeouts
    }

    pub async fn get(&self, url: &str, timeout: Duration) -> Result<UpstreamResponse> {
        self.send_with_retry(url, || self.http.get(url).timeout(timeout))
            .await
    }

    pub async fn post_json<T>(&self, url: &str, body: &T, timeout: Duration) -> Result<UpstreamResponse>
    where
        T: Serialize + ?Sized,
    {
        self.send_with_retry(url, || self.http.post(url).json(body).timeout(timeout))
            .await
    }

    pub async fn sd_models(&self) -> Result<UpstreamResponse> {
        let url = self.api_url("sd-models");
        self.get(&url, self.timeouts.models()).await
    }

    pub async fn set_options(&self, update: &OptionsUpdate) -> Result<UpstreamResponse> {
        let url = self.api_url("options");
        self.post_json(&url, update, self.timeouts.options()).await
    }

    pub async fn progress(&self) -> Result<UpstreamResponse> {
        let url = self.api_url("progress");
        self.get(&url, self.timeouts.progress()).await
    }

    /// POSTs `body` to a generation endpoint such as `txt2img` or `img2img`.
    pub async fn generate<T>(&self, endpoint: &str, body: &T) -> Result<UpstreamResponse>
    where
        T: Serialize + ?Sized,
    {
        let url = self.api_url(endpoint);
        self.post_json(&url, body, self.timeouts.generation()).await
    }

    pub async fn face_swap(&self, payload: &FaceSwapPayload) -> Result<UpstreamResponse> {
        let url = self.face_swap_url();
        self.post_json(&url, payload, self.timeouts.generation())
            .await
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<UpstreamResponse>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;

        loop {
            let response = build().send().await?;
            let status = response.status();

            if !self.retry.is_retryable(status) {
                let body = response.text().await?;
                debug!("{} answered {}", url, status);
                return Ok(UpstreamResponse { status, body });
            }

            if retries >= self.retry.max_retries {
                warn!("{} still answering {} after {} retries", url, status, retries);
                return Err(Error::RetriesExhausted {
                    url: url.to_string(),
                    status: status.as_u16(),
                    retries,
                });
            }

            retries += 1;
            let backoff = self.retry.backoff_duration(retries);
            debug!(
                "{} answered {}, retry {}/{} in {:?}",
                url, status, retries, self.retry.max_retries, backoff
            );
            self.clock.sleep(backoff).await;
        }
    }
}
