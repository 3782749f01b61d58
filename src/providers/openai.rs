//! OpenAI-compatible provider implementation
//!
//! Talks to any server exposing `POST {api_base}/chat/completions` with
//! bearer-token authentication.

use crate::config::OpenAiConfig;
use crate::error::{Result, VibeError};
use crate::providers::{ChatProvider, Message};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI chat completions provider
///
/// # Examples
///
/// ```no_run
/// use vinylvibe::config::OpenAiConfig;
/// use vinylvibe::providers::{ChatProvider, OpenAiProvider};
///
/// # async fn example() -> vinylvibe::error::Result<()> {
/// let config = OpenAiConfig {
///     api_key: "sk-...".to_string(),
///     ..OpenAiConfig::default()
/// };
/// let provider = OpenAiProvider::new(config)?;
/// let reply = provider.complete("You are helpful.", "Name one jazz standard").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Message,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns `VibeError::MissingCredentials` when the API key is empty,
    /// or `VibeError::Config` if the HTTP client cannot be built
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(VibeError::MissingCredentials(
                "openai: no API key provided. Set VINYLVIBE_OPENAI_API_KEY or OPENAI_API_KEY"
                    .to_string(),
            )
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("vinylvibe/0.1.0")
            .build()
            .map_err(|e| VibeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Configured API base URL
    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![Message::system(system_prompt), Message::user(prompt)],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!("Sending OpenAI request: model={}", self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI request failed: {}", e);
                VibeError::Transport(format!("API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(VibeError::Transport(format!(
                "API call failed: {} - {}",
                status.as_u16(),
                error_text
            ))
            .into());
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to decode OpenAI response: {}", e);
            VibeError::Transport(format!("Failed to decode API response: {}", e))
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                VibeError::Transport("API response contained no choices".to_string()).into()
            })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: key.to_string(),
            ..OpenAiConfig::default()
        }
    }

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAiProvider::new(config_with_key("sk-test")).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-3.5-turbo");
        assert_eq!(provider.api_base(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_openai_provider_rejects_blank_key() {
        let err = OpenAiProvider::new(config_with_key("   ")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VibeError>(),
            Some(VibeError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut config = config_with_key("sk-test");
        config.api_base = "http://localhost:9999/v1/".to_string();
        let provider = OpenAiProvider::new(config).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![Message::system("s"), Message::user("u")],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][1]["role"], "user");
    }
}
