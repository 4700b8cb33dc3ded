use super::types::JobEvent;
use crate::inference::{InferenceResponse, Orchestrator};
use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Runs one job to completion. Never fails: anything that escapes the
/// orchestrator is folded into a `Handler error` envelope.
pub async fn handle_event(orchestrator: &Orchestrator, event: JobEvent) -> InferenceResponse {
    let job_id = event.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = info_span!("job", %job_id);

    async move {
        let Some(input) = event.input else {
            error!("Event carried no input");
            return InferenceResponse::error("Handler error: event has no input");
        };

        match orchestrator.run(input).await {
            Ok(response) => {
                if response.is_error() {
                    info!("Job finished with an error envelope");
                } else {
                    info!("Job finished successfully");
                }
                response
            }
            Err(e) => {
                error!("Job failed: {}", e);
                InferenceResponse::error(format!("Handler error: {}", e))
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn run_job(
    State(state): State<AppState>,
    Json(event): Json<JobEvent>,
) -> Json<InferenceResponse> {
    Json(handle_event(&state.orchestrator, event).await)
}
