//! Ollama provider implementation for VinylVibe
//!
//! This module implements [`ChatProvider`] for Ollama, connecting to a local
//! or remote Ollama server's non-streaming chat endpoint.

use crate::config::OllamaConfig;
use crate::error::{Result, VibeError};
use crate::providers::{ChatProvider, Message};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use vinylvibe::config::OllamaConfig;
/// use vinylvibe::providers::{ChatProvider, OllamaProvider};
///
/// # async fn example() -> vinylvibe::error::Result<()> {
/// let config = OllamaConfig {
///     host: "http://localhost:11434".to_string(),
///     model: "llama3.2:latest".to_string(),
/// };
/// let provider = OllamaProvider::new(config)?;
/// let reply = provider.complete("You are helpful.", "Hello!").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    format: &'static str,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Message,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent("vinylvibe/0.1.0")
            .build()
            .map_err(|e| VibeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    ///
    /// # Examples
    ///
    /// ```
    /// use vinylvibe::config::OllamaConfig;
    /// use vinylvibe::providers::OllamaProvider;
    ///
    /// let config = OllamaConfig {
    ///     host: "http://localhost:11434".to_string(),
    ///     model: "llama3.2:latest".to_string(),
    /// };
    /// let provider = OllamaProvider::new(config).unwrap();
    /// assert_eq!(provider.host(), "http://localhost:11434");
    /// ```
    pub fn host(&self) -> &str {
        &self.config.host
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages: vec![Message::system(system_prompt), Message::user(prompt)],
            stream: false,
            format: "json",
        };

        tracing::debug!("Sending Ollama request: model={}", request.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                VibeError::Transport(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(VibeError::Transport(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            VibeError::Transport(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        Ok(ollama_response.message.content)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
