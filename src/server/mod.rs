pub mod handlers;
mod types;

pub use types::JobEvent;

use crate::{Result, config::ServerConfig, inference::Orchestrator};
use axum::{Router, routing::post};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let app_state = handlers::AppState { orchestrator };

    Router::new()
        .route("/", post(handlers::run_job))
        .route("/runsync", post(handlers::run_job))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run(config: &ServerConfig, orchestrator: Arc<Orchestrator>) -> Result<()> {
    let app = router(orchestrator);

    let addr = SocketAddr::new(config.host.parse()?, config.port);

    info!("Accepting jobs on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
