//! Base provider trait and common types for VinylVibe
//!
//! This module defines the [`ChatProvider`] trait every model backend
//! implements. The engine only needs single-turn completions: one system
//! prompt, one user prompt, one text reply.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for chat-style APIs
///
/// Both supported backends take a list of role-tagged messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use vinylvibe::providers::Message;
    ///
    /// let msg = Message::user("Suggest five songs");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use vinylvibe::providers::Message;
    ///
    /// let msg = Message::system("You are a music recommendation assistant.");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Opaque "text in, text out" model client
///
/// Implementations perform exactly one network round trip per call and never
/// retry. Rate limiting, caching and parsing live in the gateway.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Complete a single-turn exchange
    ///
    /// # Arguments
    ///
    /// * `system_prompt` - Role instructions sent as the system message
    /// * `prompt` - The user prompt
    ///
    /// # Returns
    ///
    /// The raw text content of the model's reply
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Transport` if the request fails or the server
    /// answers with a non-success status
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String>;

    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("hi").role, "user");
        assert_eq!(Message::system("rules").role, "system");
        assert_eq!(Message::assistant("ok").content, "ok");
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_message_missing_content_defaults_empty() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert!(msg.content.is_empty());
    }
}
