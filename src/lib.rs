//! Study material generator
//!
//! Transcribes uploaded lectures with Whisper and asks an Ollama model for a
//! summary, study notes and a study plan.

pub mod api;
pub mod config;
pub mod llm;
pub mod material;
pub mod processing;
pub mod transcription;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder, LLMConfig, TranscriptionConfig};
pub use crate::llm::{build_study_prompt, parse_model_json, GenerationError, OllamaClient, StudyGenerator};
pub use crate::material::{StudyMaterial, StudyResponse};
pub use crate::processing::{PipelineError, StudyPipeline, UploadedMedia};
pub use crate::transcription::{Transcriber, TranscriptionError, WhisperTranscriber};
