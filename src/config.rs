use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fallback generation host used when an explicit endpoint is not required
pub const DEFAULT_OLLAMA_HOST: &str = "http://ollama:11434";

/// Configuration for the study material service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Speech-to-text settings
    pub transcription: TranscriptionConfig,

    /// Generation endpoint settings
    pub llm: LLMConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Whisper model size (tiny, base, small, medium, large...)
    pub model: String,

    /// Extra directory searched for ggml model files
    pub model_dir: Option<PathBuf>,

    /// Language hint passed to Whisper
    pub language: Option<String>,

    /// Timeout for a single transcription run (seconds)
    pub timeout_seconds: u64,

    /// Let Whisper use the GPU when the backend supports it
    pub use_gpu: bool,
}

/// Generation endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Base address of the Ollama-compatible service
    pub endpoint: Option<String>,

    /// Model used when a request does not override it
    pub model: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Fail with a configuration error instead of falling back to the default host
    pub require_explicit_endpoint: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            model_dir: None,
            language: None,
            timeout_seconds: 1800,
            use_gpu: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "llama3.1".to_string(),
            timeout_seconds: 120,
            require_explicit_endpoint: true,
        }
    }
}

impl LLMConfig {
    /// Endpoint the client should talk to, if any.
    ///
    /// Blank values count as unset. Without an explicit endpoint the default
    /// host is only used when `require_explicit_endpoint` is off.
    pub fn resolve_endpoint(&self) -> Option<String> {
        match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => Some(endpoint.to_string()),
            _ if self.require_explicit_endpoint => None,
            _ => Some(DEFAULT_OLLAMA_HOST.to_string()),
        }
    }
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_locations(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a single TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path.display(), e))?;
        let config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn from_default_locations() -> Self {
        let config_paths = [
            "studygen.toml",
            "config/studygen.toml",
            "/etc/studygen/config.toml",
        ];

        for path in &config_paths {
            let path = Path::new(path);
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("{}", e),
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Self::default()
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("WHISPER_MODEL") {
            self.transcription.model = model;
        }

        if let Some(host) = lookup("OLLAMA_HOST") {
            self.llm.endpoint = Some(host);
        }

        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.model = model;
        }

        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }

        if let Some(flag) = lookup("STUDYGEN_REQUIRE_ENDPOINT") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.llm.require_explicit_endpoint = true,
                "0" | "false" | "no" => self.llm.require_explicit_endpoint = false,
                other => tracing::warn!("Ignoring invalid STUDYGEN_REQUIRE_ENDPOINT value: {}", other),
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be greater than 0"));
        }

        if self.transcription.model.trim().is_empty() {
            return Err(anyhow!("transcription.model must not be empty"));
        }

        if self.transcription.timeout_seconds == 0 {
            return Err(anyhow!("transcription.timeout_seconds must be greater than 0"));
        }

        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("llm.model must not be empty"));
        }

        if self.llm.timeout_seconds == 0 {
            return Err(anyhow!("llm.timeout_seconds must be greater than 0"));
        }

        if let Some(endpoint) = self.llm.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
            let url = url::Url::parse(endpoint.trim())
                .map_err(|e| anyhow!("llm.endpoint is not a valid URL ({}): {}", endpoint, e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(anyhow!("llm.endpoint must use http or https: {}", endpoint));
            }
        }

        Ok(())
    }
}

/// Builder for tweaking configuration in code
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_whisper_model(mut self, model: &str) -> Self {
        self.config.transcription.model = model.to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.config.llm.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_llm_model(mut self, model: &str) -> Self {
        self.config.llm.model = model.to_string();
        self
    }

    pub fn with_llm_timeout(mut self, seconds: u64) -> Self {
        self.config.llm.timeout_seconds = seconds;
        self
    }

    pub fn require_explicit_endpoint(mut self, required: bool) -> Self {
        self.config.llm.require_explicit_endpoint = required;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
