use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SubsError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: TranslateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Target language, free-form ("Spanish") or a two-letter code ("es")
    pub target_language: Option<String>,
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Number of subtitle entries sent together in one request
    pub batch_size: usize,
    /// Retry budget for a failing single entry after batches have been split down
    pub max_retries: u32,
    /// Pause after a failed model call before trying again (milliseconds)
    pub retry_delay_ms: u64,
    /// HTTP timeout for a single model call (seconds)
    pub request_timeout_secs: u64,
    /// Sampling temperature passed to the model, model default when unset
    pub temperature: Option<f32>,
    /// Prefix for entries that could not be translated; original text is kept either way
    pub fallback_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for a daily rolling log file, console only when unset
    pub log_dir: Option<PathBuf>,
    /// Show a progress bar on stderr
    pub progress: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            target_language: None,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            batch_size: 20,
            max_retries: 2,
            retry_delay_ms: 1000,
            request_timeout_secs: 300,
            temperature: None,
            fallback_marker: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            progress: true,
        }
    }
}

impl TranslateConfig {
    /// The configured target language, trimmed
    pub fn target_language(&self) -> Result<&str> {
        self.target_language
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .ok_or_else(|| SubsError::Config("Target language is required (use --lang)".to_string()))
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubsError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SubsError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubsError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings that would make a run meaningless before any work starts
    pub fn validate(&self) -> Result<()> {
        self.translate.target_language()?;

        if self.translate.batch_size == 0 {
            return Err(SubsError::Config("Batch size must be at least 1".to_string()));
        }

        let endpoint = &self.translate.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(SubsError::Config(format!(
                "Invalid endpoint '{}': expected an http:// or https:// URL",
                endpoint
            )));
        }

        if self.translate.model.trim().is_empty() {
            return Err(SubsError::Config("Model name must not be empty".to_string()));
        }

        Ok(())
    }
}
