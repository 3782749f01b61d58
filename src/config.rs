//! Configuration management for VinylVibe
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, VibeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for VinylVibe
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model provider configuration (OpenAI-compatible, Ollama)
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Rate limiting and caching in front of the model
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Debounce timings and log capacities
    #[serde(default)]
    pub engine: EngineConfig,
    /// Preference database location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Streaming playback provider
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Provider configuration
///
/// Specifies which model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// OpenAI-compatible configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_type() -> String {
    "openai".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completions configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Bearer credential; usually supplied through the environment
    #[serde(default)]
    pub api_key: String,

    /// Model to request
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Base URL; `/chat/completions` is appended
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token ceiling
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            api_base: default_openai_api_base(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Model-call gateway limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Rate limit window length (seconds)
    #[serde(default = "default_rate_window")]
    pub rate_limit_window_seconds: u64,

    /// Calls admitted per window
    #[serde(default = "default_max_calls")]
    pub max_calls_per_window: u32,

    /// Lifetime of cached structured replies (seconds)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

fn default_rate_window() -> u64 {
    60
}

fn default_max_calls() -> u32 {
    10
}

fn default_cache_ttl() -> u64 {
    300
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rate_limit_window_seconds: default_rate_window(),
            max_calls_per_window: default_max_calls(),
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

impl GatewayConfig {
    /// Rate limit window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    /// Cache lifetime as a duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Engine timing and bookkeeping limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Quiet period after the last slider change before regenerating
    #[serde(default = "default_slider_debounce")]
    pub slider_debounce_ms: u64,

    /// Quiet period after the last feedback event before revising traits
    #[serde(default = "default_feedback_debounce")]
    pub feedback_debounce_ms: u64,

    /// Feedback events retained in the session log
    #[serde(default = "default_feedback_log")]
    pub feedback_log_capacity: usize,

    /// Errors retained in the session log
    #[serde(default = "default_error_log")]
    pub error_log_capacity: usize,

    /// Played songs retained as listening history
    #[serde(default = "default_history")]
    pub history_capacity: usize,
}

fn default_slider_debounce() -> u64 {
    2000
}

fn default_feedback_debounce() -> u64 {
    4000
}

fn default_feedback_log() -> usize {
    50
}

fn default_error_log() -> usize {
    10
}

fn default_history() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slider_debounce_ms: default_slider_debounce(),
            feedback_debounce_ms: default_feedback_debounce(),
            feedback_log_capacity: default_feedback_log(),
            error_log_capacity: default_error_log(),
            history_capacity: default_history(),
        }
    }
}

impl EngineConfig {
    /// Slider debounce as a duration
    pub fn slider_debounce(&self) -> Duration {
        Duration::from_millis(self.slider_debounce_ms)
    }

    /// Feedback debounce as a duration
    pub fn feedback_debounce(&self) -> Duration {
        Duration::from_millis(self.feedback_debounce_ms)
    }
}

/// Preference storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Database directory; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the database directory
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Config` when no path is configured and the
    /// platform data directory cannot be determined.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        directories::ProjectDirs::from("com", "vinylvibe", "vinylvibe")
            .map(|dirs| dirs.data_dir().join("preferences.db"))
            .ok_or_else(|| {
                VibeError::Config("Could not determine a data directory".to_string()).into()
            })
    }
}

/// Streaming playback provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Whether `play` in the session also starts playback on a device
    #[serde(default)]
    pub enabled: bool,

    /// Web API base URL
    #[serde(default = "default_playback_api_base")]
    pub api_base: String,

    /// Accounts service base URL used for token refresh
    #[serde(default = "default_accounts_base")]
    pub accounts_base: String,

    /// OAuth client id
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Current access token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Device that play requests target; the active device when unset
    #[serde(default)]
    pub device_id: Option<String>,
}

fn default_playback_api_base() -> String {
    "https://api.spotify.com".to_string()
}

fn default_accounts_base() -> String {
    "https://accounts.spotify.com".to_string()
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: default_playback_api_base(),
            accounts_base: default_accounts_base(),
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            device_id: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| VibeError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| VibeError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("VINYLVIBE_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(api_key) =
            std::env::var("VINYLVIBE_OPENAI_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
        {
            self.provider.openai.api_key = api_key;
        }

        if let Ok(model) = std::env::var("VINYLVIBE_OPENAI_MODEL") {
            self.provider.openai.model = model;
        }

        if let Ok(api_base) = std::env::var("VINYLVIBE_OPENAI_API_BASE") {
            self.provider.openai.api_base = api_base;
        }

        if let Ok(ollama_host) = std::env::var("VINYLVIBE_OLLAMA_HOST") {
            self.provider.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("VINYLVIBE_OLLAMA_MODEL") {
            self.provider.ollama.model = ollama_model;
        }

        if let Ok(path) = std::env::var("VINYLVIBE_STORAGE_PATH") {
            tracing::debug!(path = %path, "Env override: VINYLVIBE_STORAGE_PATH");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(token) = std::env::var("VINYLVIBE_SPOTIFY_ACCESS_TOKEN") {
            self.playback.access_token = Some(token);
        }

        if let Ok(token) = std::env::var("VINYLVIBE_SPOTIFY_REFRESH_TOKEN") {
            self.playback.refresh_token = Some(token);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(path.clone());
        }

        if let crate::cli::Commands::Session {
            provider: Some(provider),
        } = &cli.command
        {
            self.provider.provider_type = provider.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set. Credentials are not
    /// checked here; a missing key surfaces when the provider is built.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(VibeError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["openai", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(VibeError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if !(0.0..=2.0).contains(&self.provider.openai.temperature) {
            return Err(VibeError::Config(
                "openai.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.provider.openai.max_tokens == 0 {
            return Err(
                VibeError::Config("openai.max_tokens must be greater than 0".to_string()).into(),
            );
        }

        if self.gateway.rate_limit_window_seconds == 0 {
            return Err(VibeError::Config(
                "gateway.rate_limit_window_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.gateway.max_calls_per_window == 0 {
            return Err(VibeError::Config(
                "gateway.max_calls_per_window must be greater than 0".to_string(),
            )
            .into());
        }

        if self.engine.feedback_log_capacity == 0
            || self.engine.error_log_capacity == 0
            || self.engine.history_capacity == 0
        {
            return Err(VibeError::Config(
                "engine log capacities must be greater than 0".to_string(),
            )
            .into());
        }

        if self.playback.enabled && self.playback.access_token.is_none() {
            return Err(VibeError::Config(
                "playback.enabled requires playback.access_token".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
