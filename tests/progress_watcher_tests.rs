use sd_relay::{
    clock::Clock, config::ProgressConfig, progress::ProgressWatcher, upstream::UpstreamClient,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

mod common;
use common::{ManualClock, create_test_client, received_count};

fn watcher(server: &MockServer, clock: Arc<ManualClock>) -> ProgressWatcher {
    let client: Arc<UpstreamClient> = Arc::new(create_test_client(&server.uri(), clock.clone()));
    let clock: Arc<dyn Clock> = clock;
    ProgressWatcher::new(client, clock, &ProgressConfig::default())
}

fn progress_body(progress: f64, job_count: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "progress": progress,
        "eta_relative": 0.0,
        "state": {"job_count": job_count, "sampling_step": 0}
    }))
}

#[tokio::test]
async fn test_completes_when_idle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/progress"))
        .respond_with(progress_body(0.4, 1))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/progress"))
        .respond_with(progress_body(1.0, 0))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    assert!(watcher(&server, clock.clone()).wait_for_completion().await);
    assert_eq!(received_count(&server).await, 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(2); 2]);
}

#[tokio::test]
async fn test_full_progress_with_pending_jobs_keeps_waiting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/progress"))
        .respond_with(progress_body(1.0, 1))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/progress"))
        .respond_with(progress_body(1.0, 0))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    assert!(watcher(&server, clock.clone()).wait_for_completion().await);
    assert_eq!(received_count(&server).await, 4);
}

#[tokio::test]
async fn test_times_out_without_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/progress"))
        .respond_with(progress_body(1.0, 2))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let done = watcher(&server, clock.clone())
        .with_timeout(Duration::from_secs(10))
        .wait_for_completion()
        .await;

    assert!(!done);
    assert_eq!(received_count(&server).await, 5);
    assert_eq!(clock.elapsed(), Duration::from_secs(10));
}

#[tokio::test]
async fn test_poll_failures_do_not_abort_the_watch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/progress"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sdapi/v1/progress"))
        .respond_with(progress_body(1.0, 0))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    assert!(watcher(&server, clock).wait_for_completion().await);
}
