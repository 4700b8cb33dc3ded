use super::{
    pipeline::{Pipeline, relay_face_swap},
    request::{InferenceRequest, Task},
    response::InferenceResponse,
};
use crate::{
    Error, Result, catalog,
    clock::Clock,
    config::{Config, PipelineConfig},
    progress::ProgressWatcher,
    upstream::UpstreamClient,
};
use serde_json::{Map, Value};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Routes one job to the WebUI endpoints it needs.
pub struct Orchestrator {
    client: Arc<UpstreamClient>,
    clock: Arc<dyn Clock>,
    watcher: ProgressWatcher,
    settle: Duration,
    pipeline: PipelineConfig,
}

impl Orchestrator {
    pub fn new(client: Arc<UpstreamClient>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let watcher = ProgressWatcher::new(client.clone(), clock.clone(), &config.progress);

        Self {
            client,
            clock,
            watcher,
            settle: Duration::from_secs(config.models.settle_secs),
            pipeline: config.pipeline.clone(),
        }
    }

    /// Runs one job's `input`.
    ///
    /// Validation failures, a failed model switch and upstream refusals come
    /// back as error envelopes. An `Err` means something broke mid-flight and
    /// is turned into an envelope by the caller.
    pub async fn run(&self, input: Value) -> Result<InferenceResponse> {
        let request = match InferenceRequest::from_input(input) {
            Ok(request) => request,
            Err(Error::InvalidRequest(msg)) => return Ok(InferenceResponse::error(msg)),
            Err(e) => return Err(e),
        };
        debug!("Dispatching task {}", request.task.name());

        if let Some(model) = &request.model {
            if !catalog::switch_model(&self.client, self.clock.as_ref(), model, self.settle).await {
                return Ok(InferenceResponse::error(format!(
                    "Failed to change model to {}",
                    model
                )));
            }
        }

        match &request.task {
            Task::GetModels => Ok(InferenceResponse::Models {
                models: catalog::available_models(&self.client).await,
            }),
            Task::Txt2Img => Ok(self.forward("txt2img", &request.payload).await),
            Task::Img2Img => Ok(self.forward("img2img", &request.payload).await),
            Task::Pipeline {
                params,
                source_face,
            } => {
                let pipeline = Pipeline {
                    client: &self.client,
                    clock: self.clock.as_ref(),
                    config: &self.pipeline,
                    watcher: &self.watcher,
                };
                pipeline.run(params, source_face).await
            }
            Task::FaceSwap {
                source_image,
                target_image,
            } => relay_face_swap(&self.client, source_image, target_image).await,
        }
    }

    /// Single-stage forward; every failure becomes an envelope.
    async fn forward(&self, endpoint: &str, payload: &Map<String, Value>) -> InferenceResponse {
        info!("Forwarding to {}", self.client.api_url(endpoint));

        let response = match self.client.generate(endpoint, payload).await {
            Ok(response) => response,
            Err(e) => return InferenceResponse::from_request_error(&e),
        };

        if !response.is_ok() {
            return InferenceResponse::from_request_error(&response.into_error());
        }

        match response.json::<Value>() {
            Ok(body) => InferenceResponse::Upstream(body),
            Err(e) => InferenceResponse::error(format!("Request failed: {}", e)),
        }
    }
}
