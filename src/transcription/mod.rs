pub mod whisper;

use async_trait::async_trait;
use std::path::Path;

pub use whisper::{WhisperBackend, WhisperTranscriber};

/// Error types for transcription
#[derive(thiserror::Error, Debug)]
pub enum TranscriptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No Whisper backend found. Please install whisper.cpp or openai-whisper")]
    BackendUnavailable,

    #[error("{backend} failed with {status}: {stderr}")]
    CommandFailed {
        backend: String,
        status: String,
        stderr: String,
    },

    #[error("{backend} timed out after {seconds} seconds")]
    Timeout { backend: String, seconds: u64 },

    #[error("Unreadable Whisper output: {0}")]
    Output(String),
}

/// Speech-to-text over a file on disk
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the fully written file at `path` into trimmed plain text
    async fn transcribe(&self, path: &Path) -> Result<String, TranscriptionError>;
}
