use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{parse_model_json, ChatMessage, GenerationError, StudyGenerator, SYSTEM_INSTRUCTION};
use crate::config::LLMConfig;
use crate::material::StudyMaterial;

/// Ollama chat API client
pub struct OllamaClient {
    config: LLMConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OllamaClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    /// Full chat URL, or a configuration error when no endpoint is set
    pub fn chat_url(&self) -> Result<String, GenerationError> {
        let host = self
            .config
            .resolve_endpoint()
            .ok_or(GenerationError::MissingConfiguration)?;
        Ok(format!("{}/api/chat", host.trim_end_matches('/')))
    }

    /// Send a non-streaming chat request and return the message content.
    ///
    /// A response without message content yields `"{}"`.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, GenerationError> {
        let url = self.chat_url()?;

        let request = OllamaChatRequest {
            model,
            stream: false,
            messages,
        };

        debug!("Sending chat request to Ollama at {} (model: {})", url, model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            warn!("Ollama returned {}: {}", status, body);
            return Err(classify_failure(status, &body, model));
        }

        let chat: OllamaChatResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::UpstreamError {
                status: status.to_string(),
                detail: format!("unreadable response body: {}", e),
            })?;

        Ok(chat
            .message
            .and_then(|m| m.content)
            .unwrap_or_else(|| "{}".to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            warn!("Ollama request timed out after {}s", self.config.timeout_seconds);
            GenerationError::TransportTimeout(self.config.timeout_seconds)
        } else {
            warn!("Ollama request failed: {}", error);
            GenerationError::UpstreamError {
                status: "unreachable".to_string(),
                detail: error.to_string(),
            }
        }
    }
}

/// Map a non-success response onto the generation error taxonomy.
///
/// A 404, or a body mentioning both "model" and "not", means the model has
/// not been pulled yet.
pub fn classify_failure(status: StatusCode, body: &str, model: &str) -> GenerationError {
    let lowered = body.to_lowercase();
    let detail = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        body.to_string()
    };

    if status == StatusCode::NOT_FOUND || (lowered.contains("model") && lowered.contains("not")) {
        GenerationError::ModelUnavailable {
            model: model.to_string(),
            detail,
        }
    } else {
        GenerationError::UpstreamError {
            status: status.to_string(),
            detail,
        }
    }
}

#[async_trait]
impl StudyGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        model_override: Option<&str>,
    ) -> Result<StudyMaterial, GenerationError> {
        let model = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.config.model.as_str());

        let messages = [ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(prompt)];

        let start_time = std::time::Instant::now();
        let content = self.chat(&messages, model).await?;
        info!(
            "🧠 Generation with {} finished in {:.1}s ({} chars)",
            model,
            start_time.elapsed().as_secs_f64(),
            content.len()
        );

        let fields = parse_model_json(&content).inspect_err(|_| {
            warn!("Could not extract JSON from model output: {:.200}", content)
        })?;

        Ok(StudyMaterial::from_fields(&fields))
    }
}
