//! Configuration loading, validation, and management for Cockpit.
//!
//! Loads configuration from `~/.cockpit/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Context strategies accepted by `[context].mode`.
pub const CONTEXT_MODES: [&str; 3] = ["smart", "full", "summary"];

/// The root configuration structure.
///
/// Maps directly to `~/.cockpit/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion backend
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per reply (backend default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Context assembly budgets and strategy
    #[serde(default)]
    pub context: ContextConfig,

    /// File ingestion policy
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Transcript export settings
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("context", &self.context)
            .field("ingest", &self.ingest)
            .field("transcript", &self.transcript)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// How much of the pool and the history may be sent per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Initial context strategy: "smart", "full" or "summary"
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Token budget for the assembled file context
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Token budget for prior conversation turns
    #[serde(default = "default_max_history_tokens")]
    pub max_history_tokens: usize,

    /// Scores above this get full content in smart mode
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: u32,

    /// Replaces the built-in preamble. `{time}` is substituted per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_mode() -> String {
    "smart".into()
}
fn default_max_context_tokens() -> usize {
    8000
}
fn default_max_history_tokens() -> usize {
    4000
}
fn default_relevance_threshold() -> u32 {
    40
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            max_context_tokens: default_max_context_tokens(),
            max_history_tokens: default_max_history_tokens(),
            relevance_threshold: default_relevance_threshold(),
            system_prompt: None,
        }
    }
}

/// Which files `/load` picks up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Extensions (with leading dot, lowercase) that may be ingested
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Directory names pruned anywhere in the tree
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// File names never ingested
    #[serde(default = "default_exclude_files")]
    pub exclude_files: Vec<String>,

    /// Files above this size are recorded as failures
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Maximum entries produced by one load
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_allowed_extensions() -> Vec<String> {
    [
        ".py", ".js", ".ts", ".tsx", ".java", ".cpp", ".c", ".h", ".rs", ".go", ".rb", ".php",
        ".sh", ".bash", ".md", ".json", ".yaml", ".yml", ".toml", ".xml", ".html", ".css", ".sql",
        ".dockerfile", ".txt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_exclude_dirs() -> Vec<String> {
    [
        ".git",
        "__pycache__",
        "node_modules",
        "venv",
        ".venv",
        "dist",
        "build",
        ".idea",
        ".vscode",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_exclude_files() -> Vec<String> {
    [".env", "id_rsa", "secrets.yaml", ".DS_Store"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}
fn default_max_files() -> usize {
    300
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            exclude_dirs: default_exclude_dirs(),
            exclude_files: default_exclude_files(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Where `/save` writes `session_<timestamp>.md`
    #[serde(default = "default_transcript_dir")]
    pub directory: String,
}

fn default_transcript_dir() -> String {
    ".".into()
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            directory: default_transcript_dir(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.cockpit/config.toml).
    ///
    /// Environment overrides:
    /// - `COCKPIT_API_KEY` (only when the file sets no key)
    /// - `COCKPIT_PROVIDER`
    /// - `COCKPIT_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("COCKPIT_API_KEY").ok();
        }

        if let Ok(provider) = std::env::var("COCKPIT_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("COCKPIT_MODEL") {
            config.default_model = model;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".cockpit")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !CONTEXT_MODES.contains(&self.context.mode.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "context.mode must be one of {}, got '{}'",
                CONTEXT_MODES.join(", "),
                self.context.mode
            )));
        }

        if self.context.max_context_tokens == 0 || self.context.max_history_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "context token budgets must be > 0".into(),
            ));
        }

        if self.ingest.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_files must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            context: ContextConfig::default(),
            ingest: IngestConfig::default(),
            transcript: TranscriptConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
pub fn dirs_home() -> PathBuf {
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
