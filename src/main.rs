use anyhow::Result;
use sd_relay::{
    catalog,
    clock::{Clock, SystemClock},
    config,
    inference::Orchestrator,
    readiness::ReadinessGate,
    server,
    upstream::UpstreamClient,
};
use std::sync::Arc;
use tracing::info;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!("Starting sd-relay with log level: {}", log_level);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = Arc::new(UpstreamClient::new(&config.upstream, clock.clone())?);

    info!("Waiting for WebUI API service...");
    let gate = ReadinessGate::new(client.api_url("sd-models"), &config.readiness, clock.clone());
    gate.wait().await?;
    info!("WebUI API service is ready");

    let models = catalog::available_models(&client).await;
    info!("Available models: {}", models.len());
    for model in &models {
        info!("  - {}", model);
    }

    let orchestrator = Arc::new(Orchestrator::new(client, clock, &config));
    server::run(&config.server, orchestrator).await?;

    Ok(())
}
