//! API request handlers

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{info, warn};

use super::models::{ErrorBody, HealthStatus, ServiceInfo};
use super::server::AppState;
use crate::llm::GenerationError;
use crate::processing::{PipelineError, UploadedMedia};

/// Multipart field carrying the media file
pub const FILE_FIELD: &str = "file";
/// Optional multipart field overriding the generation model
pub const MODEL_FIELD: &str = "model";

/// Handle `GET /`
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "studygen".to_string(),
        status: "ok".to_string(),
    })
}

/// Handle health check requests
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handle `POST /process`
pub async fn process_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let (media, model_override) = match read_upload(multipart).await {
        Ok(parts) => parts,
        Err(e) => return error_response(&e),
    };

    info!(
        "📥 Received {} ({} bytes)",
        media.file_name.as_deref().unwrap_or("unnamed upload"),
        media.bytes.len()
    );

    match state.pipeline.process(&media, model_override.as_deref()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(UploadedMedia, Option<String>), PipelineError> {
    let mut multipart =
        multipart.map_err(|e| PipelineError::ClientInput(format!("Invalid upload: {}", e)))?;

    let mut media = None;
    let mut model_override = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart", e))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file", e))?;
                media = Some(UploadedMedia::new(file_name, bytes));
            }
            Some(MODEL_FIELD) => {
                let model = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read model field", e))?;
                model_override = Some(model.trim().to_string()).filter(|m| !m.is_empty());
            }
            other => warn!("Ignoring unexpected multipart field: {:?}", other),
        }
    }

    let media = media.ok_or_else(|| PipelineError::ClientInput("File is required".to_string()))?;
    Ok((media, model_override))
}

// The body limit surfaces as a multipart error carrying 413.
fn multipart_error(context: &str, error: MultipartError) -> PipelineError {
    let message = format!("{}: {}", context, error.body_text());
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PipelineError::UploadTooLarge(message)
    } else {
        PipelineError::ClientInput(message)
    }
}

/// HTTP status for each failure kind
pub fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::ClientInput(_) => StatusCode::BAD_REQUEST,
        PipelineError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        PipelineError::Storage(_) | PipelineError::Transcription(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PipelineError::Generation(e) => match e {
            GenerationError::MissingConfiguration => StatusCode::INTERNAL_SERVER_ERROR,
            GenerationError::ModelUnavailable { .. }
            | GenerationError::UpstreamError { .. }
            | GenerationError::NonJsonContent => StatusCode::BAD_GATEWAY,
            GenerationError::TransportTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        },
    }
}

fn error_response(error: &PipelineError) -> Response {
    let body = ErrorBody {
        error: error.kind().to_string(),
        detail: error.to_string(),
    };
    (status_for(error), Json(body)).into_response()
}
