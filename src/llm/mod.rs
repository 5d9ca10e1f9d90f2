pub mod ollama;
pub mod prompt;
pub mod repair;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::material::StudyMaterial;

pub use ollama::OllamaClient;
pub use prompt::{build_study_prompt, SYSTEM_INSTRUCTION};
pub use repair::parse_model_json;

/// Chat message for LLM communication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Failures of the generation step, each distinguishable by the caller
#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error("Generation endpoint is not configured. Set OLLAMA_HOST")]
    MissingConfiguration,

    #[error("Model '{model}' is not available. Ensure the model is pulled. Raw: {detail}")]
    ModelUnavailable { model: String, detail: String },

    #[error("Generation service error ({status}): {detail}")]
    UpstreamError { status: String, detail: String },

    #[error("Generation service returned non-JSON content")]
    NonJsonContent,

    #[error("Generation request timed out after {0} seconds")]
    TransportTimeout(u64),
}

impl GenerationError {
    /// Stable identifier used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::MissingConfiguration => "missing_configuration",
            GenerationError::ModelUnavailable { .. } => "model_unavailable",
            GenerationError::UpstreamError { .. } => "upstream_error",
            GenerationError::NonJsonContent => "non_json_content",
            GenerationError::TransportTimeout(_) => "transport_timeout",
        }
    }
}

/// Anything that can turn a prompt into study material
#[async_trait]
pub trait StudyGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        model_override: Option<&str>,
    ) -> Result<StudyMaterial, GenerationError>;
}
