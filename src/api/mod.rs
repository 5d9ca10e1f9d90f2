//! HTTP API
//!
//! `POST /process` takes a multipart upload and answers with the transcript
//! and generated study material.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::processing::StudyPipeline;

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{create_router, AppState};

/// API server wrapping the study pipeline
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(pipeline: Arc<StudyPipeline>, config: Arc<Config>) -> Self {
        Self {
            state: AppState { pipeline, config },
        }
    }

    /// Run the API server until it stops
    pub async fn start(self) -> Result<()> {
        info!(
            "🚀 Starting API server on port {}",
            self.state.config.server.port
        );
        server::start_http_server(self.state).await
    }
}
