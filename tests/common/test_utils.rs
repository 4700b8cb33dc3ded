use super::mocks::ManualClock;
use sd_relay::{
    clock::Clock,
    config::{Config, UpstreamConfig},
    inference::Orchestrator,
    upstream::UpstreamClient,
};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::MockServer;

/// 1x1 transparent PNG.
pub const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// A base URL nothing listens on.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

/// Default configuration pointed at `base_url`.
pub fn create_test_config(base_url: &str) -> Config {
    Config {
        upstream: UpstreamConfig::with_base_url(base_url),
        ..Config::default()
    }
}

pub fn create_test_client(base_url: &str, clock: Arc<ManualClock>) -> UpstreamClient {
    let clock: Arc<dyn Clock> = clock;
    UpstreamClient::new(&UpstreamConfig::with_base_url(base_url), clock).unwrap()
}

pub struct TestHarness {
    pub orchestrator: Orchestrator,
    pub clock: Arc<ManualClock>,
}

pub fn create_orchestrator(config: &Config) -> TestHarness {
    let clock = Arc::new(ManualClock::new());
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let client = Arc::new(UpstreamClient::new(&config.upstream, dyn_clock.clone()).unwrap());

    TestHarness {
        orchestrator: Orchestrator::new(client, dyn_clock, config),
        clock,
    }
}

pub fn harness_for(server: &MockServer) -> TestHarness {
    create_orchestrator(&create_test_config(&server.uri()))
}

pub async fn received_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

pub fn png_response() -> Value {
    json!({
        "images": [PIXEL_PNG],
        "parameters": {},
        "info": "{}"
    })
}
