//! Provider module for VinylVibe
//!
//! This module contains the model provider abstraction and implementations
//! for OpenAI-compatible servers and Ollama, plus an in-process scripted
//! provider.

pub mod base;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use base::{ChatProvider, Message};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use scripted::ScriptedProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, VibeError};
use std::sync::Arc;

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration; `provider_type` selects the backend
///
/// # Returns
///
/// Returns a shared provider instance
///
/// # Errors
///
/// Returns error if the provider type is invalid or initialization fails,
/// including `VibeError::MissingCredentials` for an OpenAI config without a key
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn ChatProvider>> {
    match config.provider_type.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.openai.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.ollama.clone())?)),
        other => Err(VibeError::Config(format!("Unknown provider type: {}", other)).into()),
    }
}
