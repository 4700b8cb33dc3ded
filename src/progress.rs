use crate::{
    clock::Clock,
    config::ProgressConfig,
    upstream::{ProgressSnapshot, UpstreamClient},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Waiting,
    Done,
}

impl WatchState {
    /// Next state after reading `snapshot`.
    ///
    /// A full progress bar with jobs still queued stays `Waiting`: the WebUI
    /// reports 1.0 for a moment before a pending job starts.
    pub fn observe(self, snapshot: &ProgressSnapshot) -> Self {
        match self {
            Self::Done => Self::Done,
            Self::Waiting if snapshot.progress >= 1.0 && snapshot.job_count() == 0 => Self::Done,
            Self::Waiting => Self::Waiting,
        }
    }
}

/// Polls `/progress` until generation finishes or the timeout passes.
pub struct ProgressWatcher {
    client: Arc<UpstreamClient>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    timeout: Duration,
}

impl ProgressWatcher {
    pub fn new(client: Arc<UpstreamClient>, clock: Arc<dyn Clock>, config: &ProgressConfig) -> Self {
        Self {
            client,
            clock,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `true` once the WebUI is idle, `false` on timeout.
    pub async fn wait_for_completion(&self) -> bool {
        let start = self.clock.now();
        let mut state = WatchState::Waiting;
        info!("Waiting for generation to complete...");

        while self.clock.now().duration_since(start) < self.timeout {
            if let Some(snapshot) = self.poll().await {
                debug!(
                    "Progress: {:.2}, Job count: {}",
                    snapshot.progress,
                    snapshot.job_count()
                );
                state = state.observe(&snapshot);
                if state == WatchState::Done {
                    info!("Generation completed");
                    return true;
                }
                if snapshot.job_count() > 0 {
                    debug!("Generation in progress... ({} jobs)", snapshot.job_count());
                }
            }

            self.clock.sleep(self.poll_interval).await;
        }

        warn!("Progress watch timed out after {:?}", self.timeout);
        false
    }

    async fn poll(&self) -> Option<ProgressSnapshot> {
        match self.client.progress().await {
            Ok(response) if response.is_ok() => match response.json::<ProgressSnapshot>() {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!("Error decoding progress: {}", e);
                    None
                }
            },
            Ok(response) => {
                warn!("Failed to get progress: {}", response.status);
                None
            }
            Err(e) => {
                warn!("Error checking progress: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::ProgressState;
    use pretty_assertions::assert_eq;

    fn snapshot(progress: f64, job_count: i64) -> ProgressSnapshot {
        ProgressSnapshot {
            progress,
            state: ProgressState { job_count },
        }
    }

    #[test]
    fn test_done_requires_full_progress_and_no_jobs() {
        assert_eq!(WatchState::Waiting.observe(&snapshot(1.0, 0)), WatchState::Done);
        assert_eq!(WatchState::Waiting.observe(&snapshot(1.0, 1)), WatchState::Waiting);
        assert_eq!(WatchState::Waiting.observe(&snapshot(0.5, 0)), WatchState::Waiting);
        assert_eq!(WatchState::Waiting.observe(&snapshot(0.0, 3)), WatchState::Waiting);
    }

    #[test]
    fn test_done_is_terminal() {
        assert_eq!(WatchState::Done.observe(&snapshot(0.0, 5)), WatchState::Done);
    }

    #[test]
    fn test_snapshot_defaults_missing_fields() {
        let parsed: ProgressSnapshot = serde_json::from_str(r#"{"eta_relative": 0}"#).unwrap();
        assert_eq!(parsed.progress, 0.0);
        assert_eq!(parsed.job_count(), 0);
    }
}
