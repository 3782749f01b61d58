//! Model-call gateway
//!
//! Every request to the language model goes through [`ModelGateway::call`]:
//! build the prompt, apply the rate limiter, consult the response cache,
//! perform the provider round trip and parse the reply. The typed
//! operations (`interpret_seed`, `generate_recommendations`,
//! `update_traits`) are thin wrappers pairing a prompt template with a
//! decoder.
//!
//! Malformed replies never surface as errors. They come back as
//! [`ModelReply::Unparsed`] or [`ModelOutcome::Failed`] so callers can fall
//! back gracefully. Transport failures and rate-limit denials are `Err`.

pub mod cache;
pub mod parse;
pub mod rate_limit;

pub use cache::{cache_key, ResponseCache};
pub use parse::{ParseTier, ReplyParser, EXTRACTED_REASON};
pub use rate_limit::RateLimiter;

use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::metrics::{self, ModelCallMetrics};
use crate::prompts::{
    self, RecommendationContext, SeedContext, TraitUpdateContext, SYSTEM_PROMPT,
};
use crate::providers::ChatProvider;
use crate::types::{FeedbackEvent, PlayedSong, Recommendation, Seed, SliderSet, Traits};

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Result of a raw gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// A decoded JSON value, fresh or from cache
    Structured(Value),
    /// No tier could decode the reply
    Unparsed {
        /// Why parsing failed
        error: String,
        /// The reply text as received
        raw_content: String,
    },
}

/// Result of a typed gateway operation
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome<T> {
    /// The model produced a usable value
    Ready(T),
    /// The model answered but the answer was unusable
    Failed {
        /// Why the answer was rejected
        error: String,
        /// Reply text, when the failure was a parse failure
        raw_content: Option<String>,
    },
}

impl<T> ModelOutcome<T> {
    /// The ready value, if any
    pub fn ready(self) -> Option<T> {
        match self {
            ModelOutcome::Ready(value) => Some(value),
            ModelOutcome::Failed { .. } => None,
        }
    }

    /// Whether the outcome is `Failed`
    pub fn is_failed(&self) -> bool {
        matches!(self, ModelOutcome::Failed { .. })
    }

    fn failed(error: impl Into<String>) -> Self {
        ModelOutcome::Failed {
            error: error.into(),
            raw_content: None,
        }
    }

    /// Decode a reply, mapping unparsed text and decoder rejections to `Failed`
    fn decode(
        reply: ModelReply,
        decoder: impl FnOnce(&Value) -> std::result::Result<T, String>,
    ) -> Self {
        match reply {
            ModelReply::Structured(value) => match decoder(&value) {
                Ok(decoded) => ModelOutcome::Ready(decoded),
                Err(error) => ModelOutcome::failed(error),
            },
            ModelReply::Unparsed { error, raw_content } => ModelOutcome::Failed {
                error,
                raw_content: Some(raw_content),
            },
        }
    }
}

/// Rate-limited, cached access to the language model
pub struct ModelGateway {
    provider: Arc<dyn ChatProvider>,
    limiter: RateLimiter,
    cache: ResponseCache,
    parser: ReplyParser,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.provider.name())
            .field("limiter", &self.limiter)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl ModelGateway {
    /// Create a gateway over `provider`
    ///
    /// # Arguments
    ///
    /// * `provider` - Model backend
    /// * `config` - Rate limit and cache settings
    /// * `clock` - Time source for the limiter and cache
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        config: &GatewayConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            limiter: RateLimiter::new(config.window(), config.max_calls_per_window),
            cache: ResponseCache::new(config.cache_ttl()),
            parser: ReplyParser::new()?,
            clock,
        })
    }

    /// Perform one model call
    ///
    /// Rate limiting is applied before the cache lookup, so cache hits count
    /// against the window too.
    ///
    /// # Arguments
    ///
    /// * `operation` - Label for logs and metrics
    /// * `build` - Prompt template
    /// * `context` - Template input; also part of the cache key
    ///
    /// # Errors
    ///
    /// Returns `VibeError::RateLimitExceeded` before any network activity
    /// when the window is exhausted, or `VibeError::Transport` when the
    /// provider call fails
    pub async fn call<C, F>(&self, operation: &str, build: F, context: &C) -> Result<ModelReply>
    where
        C: Serialize + ?Sized + Sync,
        F: FnOnce(&C) -> String,
    {
        let prompt = build(context);
        tracing::debug!(operation, "Model prompt:\n{}", prompt);

        let now = self.clock.now_millis();
        if let Err(e) = self.limiter.try_acquire(now) {
            metrics::record_rate_limit_denial();
            tracing::warn!(operation, "Model call refused: {}", e);
            return Err(e);
        }

        let key = cache_key(&prompt, context)?;
        if let Some(value) = self.cache.get(&key, now) {
            metrics::record_cache_lookup(true);
            tracing::debug!(operation, "Cache hit");
            return Ok(ModelReply::Structured(value));
        }
        metrics::record_cache_lookup(false);

        tracing::info!(
            operation,
            provider = self.provider.name(),
            "Calling model"
        );
        let call_metrics = ModelCallMetrics::new(operation);
        let raw = match self.provider.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(raw) => {
                call_metrics.record_success();
                raw
            }
            Err(e) => {
                call_metrics.record_error("transport");
                tracing::error!(operation, "Model call failed: {}", e);
                return Err(e);
            }
        };

        match self.parser.parse(&raw) {
            Ok((value, tier)) => {
                metrics::record_parse(tier.as_str());
                tracing::debug!(operation, tier = tier.as_str(), "Parsed model reply");
                self.cache.insert(key, value.clone(), now);
                Ok(ModelReply::Structured(value))
            }
            Err(error) => {
                metrics::record_parse("unparsed");
                tracing::warn!(operation, "Failed to parse model reply: {}", error);
                tracing::debug!(operation, "Raw reply:\n{}", raw);
                Ok(ModelReply::Unparsed {
                    error,
                    raw_content: raw,
                })
            }
        }
    }

    /// Infer musical traits from a seed
    pub async fn interpret_seed(&self, seed: &Seed) -> Result<ModelOutcome<Traits>> {
        if seed.value.trim().is_empty() {
            return Ok(ModelOutcome::failed("Invalid or empty seed"));
        }
        let reply = self
            .call(
                "interpret_seed",
                prompts::interpret_seed_prompt,
                &SeedContext { seed },
            )
            .await?;
        Ok(ModelOutcome::decode(reply, Traits::from_model_value))
    }

    /// Ask for the next batch of songs
    ///
    /// # Arguments
    ///
    /// * `traits` - Current traits
    /// * `sliders` - Current slider positions
    /// * `history` - Recently played songs the model should avoid
    pub async fn generate_recommendations(
        &self,
        traits: &Traits,
        sliders: &SliderSet,
        history: &[PlayedSong],
    ) -> Result<ModelOutcome<Vec<Recommendation>>> {
        let context = RecommendationContext {
            traits,
            sliders,
            last10: history,
        };
        let reply = self
            .call(
                "generate_recommendations",
                prompts::recommendations_prompt,
                &context,
            )
            .await?;
        Ok(ModelOutcome::decode(reply, |value| {
            if let Some(error) = value.get("error").and_then(Value::as_str) {
                return Err(error.to_string());
            }
            Recommendation::list_from_model_value(value)
                .ok_or_else(|| "Could not find recommendations in model reply".to_string())
        }))
    }

    /// Revise traits from a feedback batch
    pub async fn update_traits(
        &self,
        traits: &Traits,
        feedback: &[FeedbackEvent],
    ) -> Result<ModelOutcome<Traits>> {
        let reply = self
            .call(
                "update_traits",
                prompts::update_traits_prompt,
                &TraitUpdateContext { traits, feedback },
            )
            .await?;
        Ok(ModelOutcome::decode(reply, Traits::from_model_value))
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Number of cached replies
    pub fn cached_replies(&self) -> usize {
        self.cache.len()
    }
}
