//! Configuration loading, validation, and management for SmartFlow.
//!
//! Loads configuration from `~/.smartflow/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.smartflow/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which backend answers model calls: "openai" or "ollama"
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// OpenAI (or any OpenAI-compatible endpoint)
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Local Ollama server
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Session memory and vector persistence
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Retrieval settings
    #[serde(default)]
    pub rag: RagConfig,

    /// Agent loop bounds
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP server
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_llm_provider() -> String {
    "openai".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("llm_provider", &self.llm_provider)
            .field("openai", &self.openai)
            .field("ollama", &self.ollama)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("memory", &self.memory)
            .field("rag", &self.rag)
            .field("agent", &self.agent)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_openai_embedding_model")]
    pub embedding_model: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}
fn default_openai_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            embedding_model: default_openai_embedding_model(),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_ollama_embedding_model")]
    pub embedding_model: String,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_ollama_model() -> String {
    "llama3.1".into()
}
fn default_ollama_embedding_model() -> String {
    "nomic-embed-text".into()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            embedding_model: default_ollama_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Sliding-window size of each session's message log
    #[serde(default = "default_short_term_max_messages")]
    pub short_term_max_messages: usize,

    /// Directory for persisted vector collections; in-memory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_dir: Option<PathBuf>,
}

fn default_short_term_max_messages() -> usize {
    20
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_max_messages: default_short_term_max_messages(),
            persist_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_top_k() -> usize {
    4
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model calls allowed per ReAct turn (and tool rounds per plan step)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Plan steps executed per Plan-Execute turn
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_iterations() -> usize {
    10
}
fn default_max_steps() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_steps: default_max_steps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.smartflow/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment variable overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm_provider = provider.to_lowercase();
        }

        if let Some(key) = lookup("SMARTFLOW_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            if !key.is_empty() {
                self.openai.api_key = Some(key);
            }
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(model) = lookup("OPENAI_EMBEDDING_MODEL") {
            self.openai.embedding_model = model;
        }

        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(model) = lookup("OLLAMA_EMBEDDING_MODEL") {
            self.ollama.embedding_model = model;
        }

        if let Some(dir) = lookup("VECTOR_PERSIST_DIR").or_else(|| lookup("CHROMA_PERSIST_DIR")) {
            self.memory.persist_dir = Some(PathBuf::from(dir));
        }
        if let Some(host) = lookup("API_HOST") {
            self.gateway.host = host;
        }

        parse_override(&lookup, "LLM_TEMPERATURE", &mut self.temperature);
        parse_override(&lookup, "LLM_MAX_TOKENS", &mut self.max_tokens);
        parse_override(
            &lookup,
            "SHORT_TERM_MAX_MESSAGES",
            &mut self.memory.short_term_max_messages,
        );
        parse_override(&lookup, "API_PORT", &mut self.gateway.port);
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".smartflow")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.llm_provider.as_str(), "openai" | "ollama") {
            return Err(ConfigError::ValidationError(format!(
                "llm_provider must be \"openai\" or \"ollama\", got \"{}\"",
                self.llm_provider
            )));
        }

        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.short_term_max_messages == 0 {
            return Err(ConfigError::ValidationError(
                "memory.short_term_max_messages must be > 0".into(),
            ));
        }

        if self.rag.chunk_size == 0 || self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::ValidationError(
                "rag.chunk_overlap must be smaller than a non-zero rag.chunk_size".into(),
            ));
        }

        if self.rag.top_k == 0 {
            return Err(ConfigError::ValidationError("rag.top_k must be > 0".into()));
        }

        Ok(())
    }

    /// Model used for chat completions by the selected backend.
    pub fn active_model(&self) -> &str {
        match self.llm_provider.as_str() {
            "ollama" => &self.ollama.model,
            _ => &self.openai.model,
        }
    }

    /// Model used for embeddings by the selected backend.
    pub fn active_embedding_model(&self) -> &str {
        match self.llm_provider.as_str() {
            "ollama" => &self.ollama.embedding_model,
            _ => &self.openai.embedding_model,
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(v) => *target = v,
            Err(_) => tracing::warn!(key, value = %raw, "Ignoring unparseable override"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm_provider: default_llm_provider(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            memory: MemoryConfig::default(),
            rag: RagConfig::default(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
