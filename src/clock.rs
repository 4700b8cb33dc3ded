use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Source of time for every wait in the relay.
///
/// Retry backoff, readiness polling, progress polling and settle delays all
/// sleep through this trait so they can be driven by a fake in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
