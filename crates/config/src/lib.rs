//! Configuration loading, validation, and management for Wayfarer.
//!
//! Loads configuration from `$WAYFARER_CONFIG` (or
//! `~/.wayfarer/config.toml`) with environment variable overrides.
//! Validates all settings at startup. The resulting [`AppConfig`] is
//! built once and handed to each service; nothing reads the environment
//! after that.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat façade (LLM provider) settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Maps façade (geocoder / suggest) settings
    #[serde(default)]
    pub maps: MapsConfig,
}

/// Settings for the chat façade.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_chat_port")]
    pub port: u16,

    /// LLM provider API key (`AI_SECRET_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Shared secret clients send in the `AI_BACKEND_KEY` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_key: Option<String>,

    /// Name used in logs for the provider
    #[serde(default = "default_provider_name")]
    pub provider_name: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for the answer and title endpoints
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per answer (`MAX_TOKENS_RESPONSE`)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Max tokens for route summarization
    #[serde(default = "default_summarize_max_tokens")]
    pub summarize_max_tokens: u32,

    /// Trailing turns kept when trimming returned context
    #[serde(default = "default_keep_last")]
    pub keep_last: usize,

    #[serde(default = "default_chat_timeout")]
    pub request_timeout_secs: u64,

    /// CORS origins; empty disables the CORS layer
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_chat_port() -> u16 {
    8000
}
fn default_provider_name() -> String {
    "deepseek".into()
}
fn default_api_url() -> String {
    "https://api.deepseek.com".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_temperature() -> f32 {
    1.3
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_summarize_max_tokens() -> u32 {
    400
}
fn default_keep_last() -> usize {
    8
}
fn default_chat_timeout() -> u64 {
    120
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_chat_port(),
            api_key: None,
            backend_key: None,
            provider_name: default_provider_name(),
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            summarize_max_tokens: default_summarize_max_tokens(),
            keep_last: default_keep_last(),
            request_timeout_secs: default_chat_timeout(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Settings for the maps façade.
#[derive(Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_maps_port")]
    pub port: u16,

    /// Geocoder API key (`GEOCODER_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoder_key: Option<String>,

    /// Suggest API key (`GEOSUGGEST_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geosuggest_key: Option<String>,

    /// Client-side map display key (`YANDEX_MAPS_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_api_key: Option<String>,

    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,

    #[serde(default = "default_suggest_url")]
    pub suggest_url: String,

    /// Language for address suggestions
    #[serde(default = "default_lang")]
    pub lang: String,

    #[serde(default = "default_maps_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_maps_port() -> u16 {
    8001
}
fn default_geocode_url() -> String {
    "https://geocode-maps.yandex.ru/v1/".into()
}
fn default_suggest_url() -> String {
    "https://suggest-maps.yandex.ru/v1/suggest".into()
}
fn default_lang() -> String {
    "ru_RU".into()
}
fn default_maps_timeout() -> u64 {
    30
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_maps_port(),
            geocoder_key: None,
            geosuggest_key: None,
            maps_api_key: None,
            geocode_url: default_geocode_url(),
            suggest_url: default_suggest_url(),
            lang: default_lang(),
            request_timeout_secs: default_maps_timeout(),
            allowed_origins: Vec::new(),
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

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("chat", &self.chat)
            .field("maps", &self.maps)
            .finish()
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &redact(&self.api_key))
            .field("backend_key", &redact(&self.backend_key))
            .field("provider_name", &self.provider_name)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("summarize_max_tokens", &self.summarize_max_tokens)
            .field("keep_last", &self.keep_last)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl std::fmt::Debug for MapsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapsConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("geocoder_key", &redact(&self.geocoder_key))
            .field("geosuggest_key", &redact(&self.geosuggest_key))
            .field("maps_api_key", &redact(&self.maps_api_key))
            .field("geocode_url", &self.geocode_url)
            .field("suggest_url", &self.suggest_url)
            .field("lang", &self.lang)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path, then apply environment
    /// overrides.
    ///
    /// Recognised variables:
    /// - `AI_SECRET_KEY`, `AI_BACKEND_KEY`, `MAX_TOKENS_RESPONSE`
    /// - `GEOCODER_KEY`, `GEOSUGGEST_KEY`, `YANDEX_MAPS_API_KEY`
    /// - `WAYFARER_CHAT_PORT`, `WAYFARER_MAPS_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Override fields from environment-style lookups.
    ///
    /// Takes a lookup function so tests can inject values without
    /// touching the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = secret("AI_SECRET_KEY") {
            self.chat.api_key = Some(v);
        }
        if let Some(v) = secret("AI_BACKEND_KEY") {
            self.chat.backend_key = Some(v);
        }
        if let Some(v) = lookup("MAX_TOKENS_RESPONSE") {
            self.chat.max_tokens = parse_number("MAX_TOKENS_RESPONSE", &v)?;
        }
        if let Some(v) = lookup("WAYFARER_CHAT_PORT") {
            self.chat.port = parse_number("WAYFARER_CHAT_PORT", &v)?;
        }

        if let Some(v) = secret("GEOCODER_KEY") {
            self.maps.geocoder_key = Some(v);
        }
        if let Some(v) = secret("GEOSUGGEST_KEY") {
            self.maps.geosuggest_key = Some(v);
        }
        if let Some(v) = secret("YANDEX_MAPS_API_KEY") {
            self.maps.maps_api_key = Some(v);
        }
        if let Some(v) = lookup("WAYFARER_MAPS_PORT") {
            self.maps.port = parse_number("WAYFARER_MAPS_PORT", &v)?;
        }

        Ok(())
    }

    /// Path of the config file: `$WAYFARER_CONFIG` or
    /// `~/.wayfarer/config.toml`.
    pub fn config_path() -> PathBuf {
        std::env::var("WAYFARER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"))
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wayfarer")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::ValidationError(
                "chat.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.chat.max_tokens == 0 || self.chat.summarize_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "chat.max_tokens and chat.summarize_max_tokens must be > 0".into(),
            ));
        }

        for (name, url) in [
            ("chat.api_url", &self.chat.api_url),
            ("maps.geocode_url", &self.maps.geocode_url),
            ("maps.suggest_url", &self.maps.suggest_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{name} must not be empty")));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Copy with every configured secret replaced by `***`, for display.
    pub fn redacted(&self) -> Self {
        let mask = |s: &Option<String>| s.as_ref().map(|_| "***".to_string());
        let mut copy = self.clone();
        copy.chat.api_key = mask(&self.chat.api_key);
        copy.chat.backend_key = mask(&self.chat.backend_key);
        copy.maps.geocoder_key = mask(&self.maps.geocoder_key);
        copy.maps.geosuggest_key = mask(&self.maps.geosuggest_key);
        copy.maps.maps_api_key = mask(&self.maps.maps_api_key);
        copy
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} must be a number, got '{value}'")))
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
