use axum::body::Bytes;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::llm::{build_study_prompt, GenerationError, StudyGenerator};
use crate::material::StudyResponse;
use crate::transcription::{Transcriber, TranscriptionError};

/// Raw upload as received from the caller
#[derive(Debug, Clone, Default)]
pub struct UploadedMedia {
    /// Original file name, used only to keep the extension
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl UploadedMedia {
    pub fn new(file_name: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name,
            bytes: bytes.into(),
        }
    }

    fn extension(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

/// Pipeline failures, one variant per caller-visible kind
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    ClientInput(String),

    #[error("{0}")]
    UploadTooLarge(String),

    #[error("Failed to stage upload: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ClientInput(_) => "client_input",
            PipelineError::UploadTooLarge(_) => "upload_too_large",
            PipelineError::Storage(_) => "storage",
            PipelineError::Transcription(_) => "transcription",
            PipelineError::Generation(e) => e.kind(),
        }
    }
}

/// Upload → transcript → study material, with the upload staged in a temp file
pub struct StudyPipeline {
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn StudyGenerator>,
}

impl StudyPipeline {
    pub fn new(transcriber: Arc<dyn Transcriber>, generator: Arc<dyn StudyGenerator>) -> Self {
        Self {
            transcriber,
            generator,
        }
    }

    /// Run the whole pipeline for one upload.
    ///
    /// The staged temp file is removed before returning, whatever the outcome.
    pub async fn process(
        &self,
        media: &UploadedMedia,
        model_override: Option<&str>,
    ) -> Result<StudyResponse, PipelineError> {
        if media.bytes.is_empty() {
            return Err(PipelineError::ClientInput("File is required".to_string()));
        }

        let staged = stage_upload(media).await?;
        let outcome = self.run(staged.path(), model_override).await;

        let staged_path = staged.path().to_path_buf();
        if let Err(e) = staged.close() {
            warn!("Failed to remove temp file {}: {}", staged_path.display(), e);
        }

        if let Err(e) = &outcome {
            error!("❌ Pipeline failed ({}): {}", e.kind(), e);
        }
        outcome
    }

    /// Run the pipeline on a local file, staged exactly like an upload
    pub async fn process_file(
        &self,
        path: &Path,
        model_override: Option<&str>,
    ) -> Result<StudyResponse, PipelineError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PipelineError::ClientInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        self.process(&UploadedMedia::new(file_name, bytes), model_override)
            .await
    }

    async fn run(
        &self,
        path: &Path,
        model_override: Option<&str>,
    ) -> Result<StudyResponse, PipelineError> {
        let start_time = std::time::Instant::now();

        let transcript = self.transcriber.transcribe(path).await?;
        info!("📝 Transcript ready ({} characters)", transcript.len());

        let prompt = build_study_prompt(&transcript);
        let material = self.generator.generate(&prompt, model_override).await?;

        info!(
            "✅ Study material generated in {:.1}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(StudyResponse {
            transcript,
            material,
        })
    }
}

async fn stage_upload(media: &UploadedMedia) -> Result<NamedTempFile, PipelineError> {
    let suffix = media.extension().map(|ext| format!(".{ext}")).unwrap_or_default();
    let staged = tempfile::Builder::new()
        .prefix("studygen-upload-")
        .suffix(&suffix)
        .tempfile()?;

    let mut file = tokio::fs::File::create(staged.path()).await?;
    file.write_all(&media.bytes).await?;
    file.flush().await?;
    debug!(
        "Staged {} bytes at {}",
        media.bytes.len(),
        staged.path().display()
    );
    Ok(staged)
}
