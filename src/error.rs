//! Error types for VinylVibe
//!
//! This module defines the error taxonomy used throughout the engine,
//! using `thiserror` for ergonomic error handling.
//!
//! Parse failures of model output are deliberately absent: they are absorbed
//! into [`crate::gateway::ModelOutcome::Failed`] and never raised.

use thiserror::Error;

/// Main error type for VinylVibe operations
#[derive(Error, Debug)]
pub enum VibeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing credentials for a model provider (fatal at construction)
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Rate limit exceeded for model calls
    #[error("Rate limit exceeded: limit={limit}, {message}")]
    RateLimitExceeded {
        /// The configured per-window ceiling that was exceeded
        limit: u32,
        /// Additional message explaining the failure
        message: String,
    },

    /// Network or HTTP failure while talking to a model provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input (empty seed, unknown cooldown class, bad slider value)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A generation cycle was aborted
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Preference storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Streaming playback provider errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Authentication errors (e.g., token refresh rejected)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VibeError {
    /// Returns true when the error is a rate-limit denial
    ///
    /// Callers use this to decide whether waiting (rather than retrying
    /// immediately) is the right recovery.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, VibeError::RateLimitExceeded { .. })
    }
}

/// Result type alias for VinylVibe operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Use
/// `err.downcast_ref::<VibeError>()` to classify a failure.
pub type Result<T> = anyhow::Result<T>;
