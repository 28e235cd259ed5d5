//! Configuration loading, validation, and management for ragctx.
//!
//! Loads configuration from `~/.ragctx/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ragctx/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Retrieval backend connection
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Query strategy tuning
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Media proxy settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Prompt template overrides
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base endpoint of the retrieval API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (usually supplied through the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.ragie.ai".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Result counts and thresholds used by the retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Result count for a plain semantic search
    #[serde(default = "default_top_k")]
    pub default_top_k: u32,

    /// Result count when breadth or rerank is requested
    #[serde(default = "default_breadth_top_k")]
    pub breadth_top_k: u32,

    /// Minimum result count for filename searches
    #[serde(default = "default_filename_min_top_k")]
    pub filename_min_top_k: u32,

    /// Below this many chunks the filtered filename search is widened
    #[serde(default = "default_filename_min_results")]
    pub filename_min_results: usize,

    /// Per-document cap applied to breadth searches
    #[serde(default = "default_breadth_max_chunks")]
    pub breadth_max_chunks_per_document: u32,
}

fn default_top_k() -> u32 {
    6
}
fn default_breadth_top_k() -> u32 {
    30
}
fn default_filename_min_top_k() -> u32 {
    12
}
fn default_filename_min_results() -> usize {
    3
}
fn default_breadth_max_chunks() -> u32 {
    4
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            breadth_top_k: default_breadth_top_k(),
            filename_min_top_k: default_filename_min_top_k(),
            filename_min_results: default_filename_min_results(),
            breadth_max_chunks_per_document: default_breadth_max_chunks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Same-origin path of the authenticated asset streaming endpoint
    #[serde(default = "default_stream_endpoint")]
    pub stream_endpoint: String,
}

fn default_stream_endpoint() -> String {
    "/api/ragie/stream".into()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            stream_endpoint: default_stream_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Replaces the built-in retrieval system prompt for tenants without their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Replaces the built-in grounding prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_prompt: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.ragctx/config.toml).
    ///
    /// Environment overrides:
    /// - `RAGCTX_API_KEY`, then `RAGIE_API_KEY` (only when no key is configured)
    /// - `RAGCTX_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with(&config_path, |key| std::env::var(key).ok())
    }

    /// Load `path`, apply overrides from `lookup`, then validate the result.
    pub fn load_with(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.retrieval.api_key.is_none() {
            self.retrieval.api_key = lookup("RAGCTX_API_KEY").or_else(|| lookup("RAGIE_API_KEY"));
        }

        if let Some(base_url) = lookup("RAGCTX_BASE_URL") {
            self.retrieval.base_url = base_url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragctx")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.retrieval.base_url.starts_with("http") {
            return Err(ConfigError::ValidationError(
                "retrieval.base_url must be an http(s) URL".into(),
            ));
        }

        let s = &self.strategy;
        if s.default_top_k == 0 || s.breadth_top_k == 0 || s.filename_min_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "strategy top_k values must be > 0".into(),
            ));
        }

        if s.breadth_top_k < s.default_top_k {
            return Err(ConfigError::ValidationError(
                "strategy.breadth_top_k must be >= strategy.default_top_k".into(),
            ));
        }

        if !self.media.stream_endpoint.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "media.stream_endpoint must be a same-origin path starting with '/'".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.retrieval.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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
