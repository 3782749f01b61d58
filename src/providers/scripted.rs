//! In-process scripted provider
//!
//! [`ScriptedProvider`] replaces network I/O in tests and offline demos.
//! Replies come from a responder closure (routing on prompt text) or from a
//! fixed queue. Every prompt is recorded so tests can assert on call counts.

use crate::error::{Result, VibeError};
use crate::providers::ChatProvider;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type Responder = dyn Fn(&str) -> Result<String> + Send + Sync;

enum Script {
    Responder(Box<Responder>),
    Queue(Mutex<VecDeque<Result<String>>>),
}

/// Deterministic provider driven by a script
///
/// # Examples
///
/// ```
/// use vinylvibe::providers::{ChatProvider, ScriptedProvider};
///
/// # #[tokio::main]
/// # async fn main() {
/// let provider = ScriptedProvider::new(|prompt| {
///     if prompt.contains("extract") {
///         Ok(r#"{"genre":["folk"],"mood":"calm","tempo":40,"lyricsTheme":"home","instruments":[]}"#.to_string())
///     } else {
///         Ok("[]".to_string())
///     }
/// });
/// let reply = provider.complete("system", "extract traits").await.unwrap();
/// assert!(reply.contains("folk"));
/// assert_eq!(provider.call_count(), 1);
/// # }
/// ```
pub struct ScriptedProvider {
    script: Script,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Answer every prompt through `responder`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            script: Script::Responder(Box::new(responder)),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer prompts with `replies` in order
    ///
    /// Once the queue is exhausted every call fails with a transport error.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = replies.into_iter().map(|r| Ok(r.into())).collect();
        Self {
            script: Script::Queue(Mutex::new(queue)),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay every reply by `latency`
    ///
    /// Uses `tokio::time::sleep`, so a paused test clock controls it.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Prompts received so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.lock_calls().clone()
    }

    /// Number of prompts received so far
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Number of received prompts containing `needle`
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.lock_calls()
            .iter()
            .filter(|prompt| prompt.contains(needle))
            .count()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply_for(&self, prompt: &str) -> Result<String> {
        match &self.script {
            Script::Responder(responder) => responder(prompt),
            Script::Queue(queue) => queue
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front()
                .unwrap_or_else(|| {
                    Err(VibeError::Transport("scripted replies exhausted".to_string()).into())
                }),
        }
    }
}

impl std::fmt::Debug for ScriptedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedProvider")
            .field("latency", &self.latency)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(&self, _system_prompt: &str, prompt: &str) -> Result<String> {
        self.lock_calls().push(prompt.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.reply_for(prompt)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_replies_in_order_then_fails() {
        let provider = ScriptedProvider::with_replies(["one", "two"]);
        assert_eq!(provider.complete("s", "a").await.unwrap(), "one");
        assert_eq!(provider.complete("s", "b").await.unwrap(), "two");
        assert!(provider.complete("s", "c").await.is_err());
        assert_eq!(provider.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_responder_can_fail() {
        let provider =
            ScriptedProvider::new(|_| Err(VibeError::Transport("offline".to_string()).into()));
        let err = provider.complete("s", "p").await.unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert_eq!(provider.calls_containing("p"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_uses_tokio_time() {
        let provider = ScriptedProvider::with_replies(["late"]).with_latency(Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        provider.complete("s", "p").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
