use crate::{
    clock::Clock,
    upstream::{ModelEntry, OptionsUpdate, UpstreamClient},
};
use std::time::Duration;
use tracing::{info, warn};

/// Titles of every checkpoint the WebUI can load.
///
/// Soft-fails: any error yields an empty list.
pub async fn available_models(client: &UpstreamClient) -> Vec<String> {
    let response = match client.sd_models().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Error getting models: {}", e);
            return Vec::new();
        }
    };

    if !response.is_ok() {
        warn!("Model list request answered {}", response.status);
        return Vec::new();
    }

    match response.json::<Vec<ModelEntry>>() {
        Ok(models) => models.into_iter().map(|m| m.title).collect(),
        Err(e) => {
            warn!("Error decoding model list: {}", e);
            Vec::new()
        }
    }
}

/// Selects `model_name` as the active checkpoint and waits `settle` for the
/// weights to load. Returns `false` on any failure; never retries.
pub async fn switch_model(
    client: &UpstreamClient,
    clock: &dyn Clock,
    model_name: &str,
    settle: Duration,
) -> bool {
    info!("Changing model to: {}", model_name);

    let update = OptionsUpdate {
        sd_model_checkpoint: model_name.to_string(),
    };

    match client.set_options(&update).await {
        Ok(response) if response.is_ok() => {
            clock.sleep(settle).await;
            info!("Model {} is active", model_name);
            true
        }
        Ok(response) => {
            warn!(
                "Failed to change model: {} - {}",
                response.status, response.body
            );
            false
        }
        Err(e) => {
            warn!("Error changing model: {}", e);
            false
        }
    }
}
