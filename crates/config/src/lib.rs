//! Configuration loading, validation, and management for assistd.
//!
//! Loads configuration from `~/.assistd/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use assistd_core::agent::AgentDefaults;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.assistd/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Timeout for a single provider request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Agent defaults applied to every new thread
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_request_timeout() -> u64 {
    120
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .field("logging", &self.logging)
            .field("providers", &self.providers)
            .finish()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System prompt for every new agent
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Most recent messages sent to the provider on each step
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Per-user agent quota (0 = unlimited)
    #[serde(default)]
    pub max_agents_per_user: usize,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".into()
}
fn default_context_window() -> usize {
    50
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            context_window: default_context_window(),
            max_agents_per_user: 0,
        }
    }
}

/// Where agents and messages are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    /// Process-local; everything is lost on restart
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite connection string; defaults to `~/.assistd/assistd.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: None,
        }
    }
}

impl StoreConfig {
    /// The effective SQLite connection string.
    pub fn database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| {
            format!(
                "sqlite://{}",
                AppConfig::config_dir().join("assistd.db").display()
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum accepted request body, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Origin allowed by CORS; `None` disables cross-origin access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origin: Option<String>,

    /// User id assumed when a request carries no `X-User-Id` header
    #[serde(default = "default_user")]
    pub default_user: String,
}

fn default_port() -> u16 {
    8283
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_body_limit() -> usize {
    1024 * 1024
}
fn default_user() -> String {
    "default".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            body_limit_bytes: default_body_limit(),
            cors_origin: None,
            default_user: default_user(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directive used when `RUST_LOG` is unset (e.g. "info,sqlx=warn")
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: default_log_filter(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.assistd/config.toml).
    ///
    /// Environment variables override file values:
    /// - `ASSISTD_API_KEY` (highest priority), `OPENROUTER_API_KEY`, `OPENAI_API_KEY`
    /// - `ASSISTD_PROVIDER`, `ASSISTD_MODEL`, `ASSISTD_DATABASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
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

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ASSISTD_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = lookup("OPENROUTER_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("ASSISTD_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("ASSISTD_MODEL") {
            self.default_model = model;
        }

        if let Some(url) = lookup("ASSISTD_DATABASE_URL") {
            self.store.database_url = Some(url);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".assistd")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.context_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.context_window must be > 0".into(),
            ));
        }

        if self.gateway.body_limit_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.body_limit_bytes must be > 0".into(),
            ));
        }

        if self.gateway.default_user.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.default_user must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Defaults for newly created agents.
    pub fn agent_defaults(&self) -> AgentDefaults {
        AgentDefaults {
            model: self.default_model.clone(),
            system_prompt: self.agent.system_prompt.clone(),
            temperature: self.default_temperature,
            max_tokens: Some(self.default_max_tokens),
            context_window: self.agent.context_window,
            max_agents_per_user: self.agent.max_agents_per_user,
        }
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
            default_max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            agent: AgentConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
            logging: LoggingConfig::default(),
            providers: HashMap::new(),
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

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.gateway.port, 8283);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.agent.context_window, config.agent.context_window);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_store_backend_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nbackend = \"postgres\"\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn enum_settings_use_lowercase_names() {
        let config: AppConfig =
            toml::from_str("[store]\nbackend = \"memory\"\n[logging]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.store.backend.to_string(), "memory");
    }

    #[test]
    fn zero_context_window_rejected() {
        let mut config = AppConfig::default();
        config.agent.context_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openrouter");
    }

    #[test]
    fn load_from_file_parses_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "llama3"

[agent]
system_prompt = "Be terse."
max_agents_per_user = 2

[store]
backend = "memory"

[gateway]
port = 9000
default_user = "ops"

[providers.ollama]
api_url = "http://localhost:11434/v1"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "llama3");
        assert_eq!(config.agent.system_prompt, "Be terse.");
        assert_eq!(config.agent.max_agents_per_user, 2);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.default_user, "ops");
        assert!(config.providers.contains_key("ollama"));
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = [unclosed").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_take_priority() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(env(&[
            ("ASSISTD_API_KEY", "from-env"),
            ("ASSISTD_MODEL", "gpt-4o"),
            ("ASSISTD_DATABASE_URL", "sqlite::memory:"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.store.database_url(), "sqlite::memory:");
    }

    #[test]
    fn vendor_key_only_fills_missing_key() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));

        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn agent_defaults_follow_config() {
        let mut config = AppConfig::default();
        config.agent.max_agents_per_user = 4;
        let defaults = config.agent_defaults();
        assert_eq!(defaults.model, config.default_model);
        assert_eq!(defaults.max_tokens, Some(4096));
        assert_eq!(defaults.max_agents_per_user, 4);
    }
}
