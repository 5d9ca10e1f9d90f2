use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

use super::{Transcriber, TranscriptionError};
use crate::config::TranscriptionConfig;

/// Whisper implementations, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperBackend {
    /// whisper.cpp via Homebrew
    WhisperCli,
    /// whisper.cpp
    WhisperCpp,
    /// Python OpenAI Whisper
    Python,
}

impl WhisperBackend {
    pub const PREFERENCE: [WhisperBackend; 3] = [
        WhisperBackend::WhisperCli,
        WhisperBackend::WhisperCpp,
        WhisperBackend::Python,
    ];

    pub fn command(&self) -> &'static str {
        match self {
            WhisperBackend::WhisperCli => "whisper-cli",
            WhisperBackend::WhisperCpp => "whisper-cpp",
            WhisperBackend::Python => "whisper",
        }
    }

    /// whisper.cpp needs a ggml model file and 16kHz WAV input
    pub fn is_cpp(&self) -> bool {
        !matches!(self, WhisperBackend::Python)
    }
}

/// Backend plus resolved model, fixed after the first transcription
#[derive(Debug, Clone)]
struct LoadedModel {
    backend: WhisperBackend,
    /// Model size name for Python Whisper, ggml file path for whisper.cpp
    model: String,
}

/// Whisper transcriber with a lazily loaded, process-wide model
pub struct WhisperTranscriber {
    config: TranscriptionConfig,
    loaded: OnceCell<LoadedModel>,
    // One transcription at a time; concurrent runs against one model are not assumed safe.
    gate: Mutex<()>,
}

impl WhisperTranscriber {
    /// Create a transcriber. Nothing is probed until the first transcription.
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            config,
            loaded: OnceCell::new(),
            gate: Mutex::new(()),
        }
    }

    pub fn model_size(&self) -> &str {
        &self.config.model
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    pub fn loaded_backend(&self) -> Option<WhisperBackend> {
        self.loaded.get().map(|m| m.backend)
    }

    async fn load(&self) -> Result<LoadedModel, TranscriptionError> {
        info!("🔍 Loading Whisper model '{}'...", self.config.model);

        for backend in WhisperBackend::PREFERENCE {
            if !check_command_available(backend.command()).await {
                debug!("❌ {} not available", backend.command());
                continue;
            }

            if !backend.is_cpp() {
                info!("✅ Using {} with model {}", backend.command(), self.config.model);
                return Ok(LoadedModel {
                    backend,
                    model: self.config.model.clone(),
                });
            }

            match self.find_ggml_model() {
                Some(path) => {
                    info!("✅ Using {} with model file {}", backend.command(), path.display());
                    return Ok(LoadedModel {
                        backend,
                        model: path.to_string_lossy().into_owned(),
                    });
                }
                None => warn!(
                    "⚠️  {} found but no ggml-{}.bin model file, trying next backend",
                    backend.command(),
                    self.config.model
                ),
            }
        }

        error!("❌ No Whisper backend found!");
        Err(TranscriptionError::BackendUnavailable)
    }

    fn model_candidates(&self) -> Vec<PathBuf> {
        let file_name = format!("ggml-{}.bin", self.config.model);
        let mut candidates = Vec::new();
        if let Some(dir) = &self.config.model_dir {
            candidates.push(dir.join(&file_name));
        }
        candidates.push(Path::new("models").join(&file_name));
        candidates.push(Path::new("/usr/local/share/whisper-cpp").join(&file_name));
        candidates.push(Path::new("/opt/homebrew/share/whisper-cpp").join(&file_name));
        candidates
    }

    fn find_ggml_model(&self) -> Option<PathBuf> {
        self.model_candidates().into_iter().find(|p| p.exists())
    }

    fn build_command(&self, model: &LoadedModel, input: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(model.backend.command());

        if model.backend.is_cpp() {
            cmd.arg("-f")
                .arg(input)
                .arg("-m")
                .arg(&model.model)
                .arg("-oj")
                .arg("-of")
                .arg(output_dir.join("transcript"));

            if let Some(language) = &self.config.language {
                cmd.arg("-l").arg(language);
            }
            if !self.config.use_gpu {
                cmd.arg("-ng");
            }
        } else {
            cmd.arg(input)
                .arg("--model")
                .arg(&model.model)
                .arg("--output_dir")
                .arg(output_dir)
                .arg("--output_format")
                .arg("json")
                .arg("--verbose")
                .arg("False");

            if let Some(language) = &self.config.language {
                cmd.arg("--language").arg(language);
            }
            if !self.config.use_gpu {
                cmd.arg("--device").arg("cpu").arg("--fp16").arg("False");
            }
        }

        cmd
    }

    /// Convert arbitrary media to the 16kHz mono WAV whisper.cpp expects
    async fn convert_to_wav(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, TranscriptionError> {
        let wav_path = output_dir.join("audio.wav");
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg(&wav_path);

        self.run("ffmpeg", cmd).await?;
        Ok(wav_path)
    }

    async fn run(&self, name: &str, mut cmd: Command) -> Result<(), TranscriptionError> {
        cmd.stdout(Stdio::null()).stderr(Stdio::piped()).kill_on_drop(true);
        debug!("Executing command: {:?}", cmd);

        let seconds = self.config.timeout_seconds;
        let output = match tokio::time::timeout(Duration::from_secs(seconds), cmd.output()).await {
            Ok(output) => output?,
            Err(_) => {
                error!("⏰ {} timed out after {}s", name, seconds);
                return Err(TranscriptionError::Timeout {
                    backend: name.to_string(),
                    seconds,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let tail = stderr
                .char_indices()
                .rev()
                .nth(499)
                .map(|(i, _)| &stderr[i..])
                .unwrap_or(stderr);
            error!("❌ {} failed with {}", name, output.status);
            return Err(TranscriptionError::CommandFailed {
                backend: name.to_string(),
                status: output.status.to_string(),
                stderr: tail.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<String, TranscriptionError> {
        let _guard = self.gate.lock().await;
        let model = self.loaded.get_or_try_init(|| self.load()).await?;

        let start_time = std::time::Instant::now();
        info!("🎤 Transcribing {} with {}", path.display(), model.backend.command());

        let work_dir = tempfile::Builder::new()
            .prefix("studygen-whisper-")
            .tempdir()?;

        let input = if model.backend.is_cpp() {
            self.convert_to_wav(path, work_dir.path()).await?
        } else {
            path.to_path_buf()
        };

        let cmd = self.build_command(model, &input, work_dir.path());
        self.run(model.backend.command(), cmd).await?;

        let json_path = find_json_output(work_dir.path()).await?;
        let json_content = tokio::fs::read_to_string(&json_path).await?;
        let text = extract_transcript_text(&json_content)?;

        info!(
            "🎉 Transcription completed in {:.1}s: {} characters",
            start_time.elapsed().as_secs_f64(),
            text.len()
        );

        Ok(text)
    }
}

/// Check if a command is available
async fn check_command_available(cmd_name: &str) -> bool {
    Command::new(cmd_name)
        .arg("--help")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

async fn find_json_output(dir: &Path) -> Result<PathBuf, TranscriptionError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            return Ok(path);
        }
    }
    Err(TranscriptionError::Output(format!(
        "no JSON output found in {}",
        dir.display()
    )))
}

/// Whisper JSON output, in the Python or whisper.cpp layout
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    text: String,
}

fn join_segments(segments: &[WhisperSegment]) -> Option<String> {
    if segments.is_empty() {
        return None;
    }
    Some(
        segments
            .iter()
            .map(|seg| seg.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Pull the transcript out of Whisper's JSON output.
///
/// Prefers the top-level `text`, then the segment texts, and yields an empty
/// string when neither is present.
pub fn extract_transcript_text(json_content: &str) -> Result<String, TranscriptionError> {
    let output: WhisperOutput = serde_json::from_str(json_content)
        .map_err(|e| TranscriptionError::Output(e.to_string()))?;

    let text = output
        .text
        .or_else(|| join_segments(&output.transcription))
        .or_else(|| join_segments(&output.segments))
        .unwrap_or_default();

    Ok(text.trim().to_string())
}
