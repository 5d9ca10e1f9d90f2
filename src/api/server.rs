//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::handlers;
use crate::config::Config;
use crate::processing::StudyPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<StudyPipeline>,
    pub config: Arc<Config>,
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/process", post(handlers::process_upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
