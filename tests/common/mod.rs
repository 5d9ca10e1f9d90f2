#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studygen::{
    GenerationError, LLMConfig, OllamaClient, StudyGenerator, StudyMaterial, StudyPipeline,
    Transcriber, TranscriptionError,
};

/// What the stub transcriber saw on one call
#[derive(Debug, Clone)]
pub struct SeenFile {
    pub path: PathBuf,
    pub existed: bool,
    pub bytes: Vec<u8>,
}

pub struct StubTranscriber {
    outcome: Result<String, String>,
    seen: Mutex<Vec<SeenFile>>,
}

impl StubTranscriber {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<SeenFile> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<String, TranscriptionError> {
        let bytes = std::fs::read(path).unwrap_or_default();
        self.seen.lock().unwrap().push(SeenFile {
            path: path.to_path_buf(),
            existed: path.exists(),
            bytes,
        });

        match &self.outcome {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(TranscriptionError::Output(message.clone())),
        }
    }
}

type Outcome = Box<dyn Fn() -> Result<StudyMaterial, GenerationError> + Send + Sync>;

pub struct StubGenerator {
    outcome: Outcome,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, Option<String>)>>,
}

impl StubGenerator {
    pub fn returning(material: StudyMaterial) -> Arc<Self> {
        Self::with(Box::new(move || Ok(material.clone())))
    }

    pub fn failing<F>(make_error: F) -> Arc<Self>
    where
        F: Fn() -> GenerationError + Send + Sync + 'static,
    {
        Self::with(Box::new(move || Err(make_error())))
    }

    fn with(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<(String, Option<String>)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StudyGenerator for StubGenerator {
    async fn generate(
        &self,
        prompt: &str,
        model_override: Option<&str>,
    ) -> Result<StudyMaterial, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), model_override.map(str::to_string)));
        (self.outcome)()
    }
}

pub fn material(summary: &str, notes: &str, study_plan: &str) -> StudyMaterial {
    StudyMaterial {
        summary: summary.to_string(),
        notes: notes.to_string(),
        study_plan: study_plan.to_string(),
    }
}

pub fn ollama_client(endpoint: &str) -> OllamaClient {
    OllamaClient::new(LLMConfig {
        endpoint: Some(endpoint.to_string()),
        ..LLMConfig::default()
    })
    .unwrap()
}

/// Mock Ollama server answering every chat request with `content`
pub async fn ollama_replying(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1",
            "message": { "role": "assistant", "content": content },
            "done": true
        })))
        .mount(&server)
        .await;
    server
}

pub fn pipeline(
    transcriber: Arc<StubTranscriber>,
    generator: Arc<dyn StudyGenerator>,
) -> StudyPipeline {
    StudyPipeline::new(transcriber, generator)
}
