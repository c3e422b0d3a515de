//! Configuration loading, validation, and management for scribeflow.
//!
//! Loads configuration from `~/.scribeflow/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.scribeflow/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// API key for the generation endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Token budget for prompt + context + history
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Retry policy for transient generation failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Conversation history settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Request timeout in seconds, enforced at the network layer
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Token budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum completion tokens requested from the endpoint
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Total context window the optimizer must fit within
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            context_window: default_context_window(),
        }
    }
}

/// Retry policy for the generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts (first try included)
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Base backoff delay in milliseconds; attempt N sleeps N * base
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Conversation history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum messages kept in the ledger before oldest are evicted
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Token budget for the history window sent with each request
    #[serde(default = "default_history_tokens")]
    pub max_history_tokens: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_history_tokens: default_history_tokens(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> usize {
    4096
}
fn default_context_window() -> usize {
    16384
}
fn default_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_max_messages() -> usize {
    100
}
fn default_history_tokens() -> usize {
    2000
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("budget", &self.budget)
            .field("retry", &self.retry)
            .field("history", &self.history)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ChatConfig {
    /// Load from the default path with environment overrides applied.
    ///
    /// Env vars: `SCRIBEFLOW_API_KEY` (falls back to `OPENAI_API_KEY`),
    /// `SCRIBEFLOW_BASE_URL`, `SCRIBEFLOW_MODEL`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("SCRIBEFLOW_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(url) = std::env::var("SCRIBEFLOW_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(model) = std::env::var("SCRIBEFLOW_MODEL") {
            config.model = model;
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
        dirs_home().join(".scribeflow")
    }

    /// Default path for the file-backed conversation ledger.
    pub fn ledger_path() -> PathBuf {
        Self::config_dir().join("conversations").join("history.jsonl")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "budget.max_tokens must be > 0".into(),
            ));
        }

        if self.budget.context_window < self.budget.max_tokens {
            return Err(ConfigError::ValidationError(
                "budget.context_window must be >= budget.max_tokens".into(),
            ));
        }

        if self.retry.attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.attempts must be >= 1".into(),
            ));
        }

        if self.history.max_messages == 0 {
            return Err(ConfigError::ValidationError(
                "history.max_messages must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            budget: BudgetConfig::default(),
            retry: RetryConfig::default(),
            history: HistoryConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ChatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.budget.max_tokens, 4096);
        assert_eq!(config.retry.attempts, 3);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = ChatConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ChatConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.budget.context_window, config.budget.context_window);
        assert_eq!(parsed.history.max_messages, config.history.max_messages);
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = ChatConfig {
            retry: RetryConfig {
                attempts: 0,
                base_delay_ms: 1000,
            },
            ..ChatConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn window_smaller_than_max_tokens_rejected() {
        let config = ChatConfig {
            budget: BudgetConfig {
                max_tokens: 8192,
                context_window: 4096,
            },
            ..ChatConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = ChatConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn malformed_config_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [not valid toml").unwrap();
        match ChatConfig::load_from(&path) {
            Err(ConfigError::ParseError { .. }) => {}
            other => panic!("Expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ChatConfig {
            api_key: Some("sk-secret".into()),
            ..ChatConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
