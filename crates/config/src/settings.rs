//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Index build/persistence configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// External provider configuration (LLM, STT, TTS, embeddings)
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Per-session pipeline configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Index configuration: where documents live and where snapshots go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory containing source documents (PDF, text, markdown)
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// Directory where the index snapshot is persisted
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,

    /// Retrieval top-k used by the chat engine
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity score for retrieved chunks
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("assets")
}
fn default_persist_dir() -> PathBuf {
    PathBuf::from("storage")
}
fn default_top_k() -> usize {
    3
}
fn default_min_score() -> f32 {
    0.0
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            persist_dir: default_persist_dir(),
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

/// External provider endpoints and credentials
///
/// API keys default to the conventional environment variables so a
/// `.env.local` file is all a deployment needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Chat completions endpoint (OpenAI-compatible)
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,

    /// Chat model name
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Chat API key
    #[serde(default = "env_groq_key")]
    pub llm_api_key: Option<String>,

    /// STT endpoint
    #[serde(default = "default_stt_endpoint")]
    pub stt_endpoint: String,

    /// STT API key
    #[serde(default = "env_deepgram_key")]
    pub stt_api_key: Option<String>,

    /// TTS endpoint
    #[serde(default = "default_tts_endpoint")]
    pub tts_endpoint: String,

    /// TTS API key
    #[serde(default = "env_openai_key")]
    pub tts_api_key: Option<String>,

    /// TTS voice name
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,

    /// Embedding endpoint (Ollama-compatible); empty string selects the
    /// offline hash embedder
    #[serde(default = "default_embedding_endpoint")]
    pub embedding_endpoint: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_llm_model() -> String {
    "llama3-70b-8192".to_string()
}
fn default_stt_endpoint() -> String {
    "https://api.deepgram.com/v1/listen".to_string()
}
fn default_tts_endpoint() -> String {
    "https://api.openai.com/v1/audio/speech".to_string()
}
fn default_tts_voice() -> String {
    "alloy".to_string()
}
fn default_embedding_endpoint() -> String {
    String::new()
}
fn default_embedding_model() -> String {
    "qwen3-embedding:0.6b".to_string()
}
fn default_embedding_dim() -> usize {
    384
}
fn env_groq_key() -> Option<String> {
    std::env::var("GROQ_API_KEY").ok()
}
fn env_deepgram_key() -> Option<String> {
    std::env::var("DEEPGRAM_API_KEY").ok()
}
fn env_openai_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: default_llm_endpoint(),
            llm_model: default_llm_model(),
            llm_api_key: env_groq_key(),
            stt_endpoint: default_stt_endpoint(),
            stt_api_key: env_deepgram_key(),
            tts_endpoint: default_tts_endpoint(),
            tts_api_key: env_openai_key(),
            tts_voice: default_tts_voice(),
            embedding_endpoint: default_embedding_endpoint(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

/// Per-session pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Greeting spoken right after the pipeline starts
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Allow user speech to interrupt assistant playback
    #[serde(default = "default_true")]
    pub barge_in_enabled: bool,

    /// VAD speech probability threshold
    #[serde(default = "default_vad_threshold")]
    pub vad_threshold: f32,

    /// Silence duration that ends a user turn (ms)
    #[serde(default = "default_min_silence_ms")]
    pub min_silence_duration_ms: u32,
}

fn default_greeting() -> String {
    "Hey, how can I help you today?".to_string()
}
fn default_vad_threshold() -> f32 {
    0.5
}
fn default_min_silence_ms() -> u32 {
    400
}
fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            barge_in_enabled: default_true(),
            vad_threshold: default_vad_threshold(),
            min_silence_duration_ms: default_min_silence_ms(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.index.min_score) {
            return Err(ConfigError::InvalidValue {
                field: "index.min_score".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", self.index.min_score),
            });
        }

        if !(0.0..=1.0).contains(&self.session.vad_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "session.vad_threshold".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    self.session.vad_threshold
                ),
            });
        }

        if self.providers.embedding_dim == 0 {
            return Err(ConfigError::InvalidValue {
                field: "providers.embedding_dim".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        // In production, speech providers need credentials
        if self.environment.is_production() {
            if self.providers.llm_api_key.is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "providers.llm_api_key".to_string(),
                    message: "LLM API key is required in production".to_string(),
                });
            }
            if self.providers.stt_api_key.is_none() {
                tracing::warn!("STT API key not set; transcription will fail");
            }
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (`DOCVOICE__` prefix, `__` separator)
/// 2. `config/{env}.yaml` (if env specified)
/// 3. `config/default.yaml`
/// 4. Built-in defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("DOCVOICE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.index.documents_dir, PathBuf::from("assets"));
        assert_eq!(settings.index.persist_dir, PathBuf::from("storage"));
        assert_eq!(settings.index.top_k, 3);
        assert!(settings.session.barge_in_enabled);
    }

    #[test]
    fn test_top_k_validation() {
        let mut settings = Settings::default();
        settings.index.top_k = 0;
        assert!(settings.validate().is_err());

        settings.index.top_k = 5;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_vad_threshold_validation() {
        let mut settings = Settings::default();
        settings.session.vad_threshold = 1.5;
        assert!(settings.validate().is_err());

        settings.session.vad_threshold = -0.1;
        assert!(settings.validate().is_err());

        settings.session.vad_threshold = 0.5;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_production_requires_llm_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.providers.llm_api_key = None;
        assert!(settings.validate().is_err());

        settings.providers.llm_api_key = Some("secret".to_string());
        assert!(settings.validate().is_ok());
    }
}
