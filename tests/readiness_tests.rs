use pretty_assertions::assert_eq;
use sd_relay::{Error, config::ReadinessConfig, readiness::ReadinessGate};
use std::{sync::Arc, time::Duration};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

mod common;
use common::{ManualClock, UNREACHABLE_URL};

fn bounded(max_attempts: u32) -> ReadinessConfig {
    ReadinessConfig {
        max_attempts: Some(max_attempts),
        ..ReadinessConfig::default()
    }
}

#[tokio::test]
async fn test_ready_on_first_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/sd-models"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let gate = ReadinessGate::new(
        format!("{}/sdapi/v1/sd-models", server.uri()),
        &ReadinessConfig::default(),
        clock.clone(),
    );

    assert_eq!(gate.wait().await.unwrap(), 1);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_keeps_polling_until_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/sd-models"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(4)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/sd-models"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let gate = ReadinessGate::new(
        format!("{}/sdapi/v1/sd-models", server.uri()),
        &ReadinessConfig::default(),
        clock.clone(),
    );

    assert_eq!(gate.wait().await.unwrap(), 5);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(200); 4]);
}

#[tokio::test]
async fn test_connection_errors_are_swallowed_until_bound() {
    let clock = Arc::new(ManualClock::new());
    let gate = ReadinessGate::new(
        format!("{}/sdapi/v1/sd-models", UNREACHABLE_URL),
        &bounded(20),
        clock.clone(),
    );

    let err = gate.wait().await.unwrap_err();

    assert!(matches!(err, Error::NotReady { attempts: 20 }));
    assert_eq!(clock.sleeps().len(), 19);
}
