use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_face_swap_path")]
    pub face_swap_path: String,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Per-call deadlines, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_options_timeout")]
    pub options_secs: u64,
    #[serde(default = "default_models_timeout")]
    pub models_secs: u64,
    #[serde(default = "default_generation_timeout")]
    pub generation_secs: u64,
    #[serde(default = "default_progress_request_timeout")]
    pub progress_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_factor_ms")]
    pub backoff_factor_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_status_forcelist")]
    pub status_forcelist: Vec<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_readiness_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_readiness_log_every")]
    pub log_every: u32,
    /// `None` waits forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_progress_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_stage_pause_ms")]
    pub stage_pause_ms: u64,
    #[serde(default)]
    pub wait_for_idle: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            face_swap_path: default_face_swap_path(),
            timeouts: TimeoutsConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl UpstreamConfig {
    /// Points every endpoint at `base_url`, keeping the remaining defaults.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            options_secs: default_options_timeout(),
            models_secs: default_models_timeout(),
            generation_secs: default_generation_timeout(),
            progress_secs: default_progress_request_timeout(),
        }
    }
}

impl TimeoutsConfig {
    pub fn options(&self) -> Duration {
        Duration::from_secs(self.options_secs)
    }

    pub fn models(&self) -> Duration {
        Duration::from_secs(self.models_secs)
    }

    pub fn generation(&self) -> Duration {
        Duration::from_secs(self.generation_secs)
    }

    pub fn progress(&self) -> Duration {
        Duration::from_secs(self.progress_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_factor_ms: default_backoff_factor_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            status_forcelist: default_status_forcelist(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_readiness_interval_ms(),
            request_timeout_secs: default_readiness_request_timeout(),
            log_every: default_readiness_log_every(),
            max_attempts: None,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_progress_timeout_secs(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            settle_secs: default_settle_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_pause_ms: default_stage_pause_ms(),
            wait_for_idle: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:7860".to_string()
}

fn default_api_prefix() -> String {
    "/sdapi/v1".to_string()
}

fn default_face_swap_path() -> String {
    "/reactor/image".to_string()
}

fn default_options_timeout() -> u64 {
    60
}

fn default_models_timeout() -> u64 {
    30
}

fn default_generation_timeout() -> u64 {
    600
}

fn default_progress_request_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    10
}

fn default_backoff_factor_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    120_000
}

fn default_status_forcelist() -> Vec<u16> {
    vec![502, 503, 504]
}

fn default_readiness_interval_ms() -> u64 {
    200
}

fn default_readiness_request_timeout() -> u64 {
    5
}

fn default_readiness_log_every() -> u32 {
    15
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_progress_timeout_secs() -> u64 {
    120
}

fn default_settle_secs() -> u64 {
    5
}

fn default_stage_pause_ms() -> u64 {
    1000
}
