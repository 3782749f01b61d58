//! Debounced feedback batching
//!
//! Reactions are logged immediately but only reach the model in batches:
//! each new event restarts a quiet-period timer, and when it fires the whole
//! batch is sent in one trait revision followed by one regeneration.

use crate::clock::Clock;
use crate::debounce::DebounceSlot;
use crate::engine::observer::{EngineObserver, PendingKind};
use crate::engine::playlist::{GenerationOutcome, PlaylistEngine};
use crate::gateway::{ModelGateway, ModelOutcome};
use crate::metrics;
use crate::state::Session;
use crate::types::{FeedbackEvent, FeedbackTrait, FeedbackValue};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Result of one flush attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    /// Another flush was running
    InFlight,
    /// Nothing was waiting
    Empty,
    /// No traits to revise yet; the batch stays queued
    NoTraits,
    /// Traits were revised and a regeneration ran
    Applied(GenerationOutcome),
    /// The revision failed; the batch was dropped
    Failed(String),
}

/// Clears the in-flight flag when a flush ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Collects feedback and periodically folds it into the session traits
pub struct FeedbackAggregator {
    session: Arc<Session>,
    gateway: Arc<ModelGateway>,
    engine: Arc<PlaylistEngine>,
    observer: Arc<dyn EngineObserver>,
    clock: Arc<dyn Clock>,
    debounce: DebounceSlot,
    batch: Mutex<Vec<FeedbackEvent>>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for FeedbackAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackAggregator")
            .field("pending", &self.pending_count())
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish()
    }
}

impl FeedbackAggregator {
    /// Create an aggregator flushing after `delay` of quiet
    pub fn new(
        session: Arc<Session>,
        gateway: Arc<ModelGateway>,
        engine: Arc<PlaylistEngine>,
        observer: Arc<dyn EngineObserver>,
        clock: Arc<dyn Clock>,
        delay: Duration,
    ) -> Self {
        Self {
            session,
            gateway,
            engine,
            observer,
            clock,
            debounce: DebounceSlot::new("feedback", delay),
            batch: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Record one reaction and restart the flush timer
    ///
    /// # Arguments
    ///
    /// * `song_id` - Cooldown key of the rated song
    /// * `trait_kind` - What was rated
    /// * `value` - Up or down
    ///
    /// # Returns
    ///
    /// The recorded event
    pub fn process(
        self: &Arc<Self>,
        song_id: &str,
        trait_kind: FeedbackTrait,
        value: FeedbackValue,
    ) -> FeedbackEvent {
        let event = FeedbackEvent {
            song_id: song_id.to_string(),
            trait_kind,
            value,
            timestamp: self.clock.now_millis(),
        };
        tracing::info!(
            song_id,
            trait_kind = trait_kind.as_str(),
            value = %value,
            "Feedback received"
        );

        self.session.update(|state| {
            state.record_feedback(event.clone());
            state.feedback_pending = true;
        });
        self.lock_batch().push(event.clone());
        self.observer.on_pending_changed(PendingKind::Feedback, true);

        let aggregator = Arc::downgrade(self);
        self.debounce.schedule(async move {
            if let Some(aggregator) = aggregator.upgrade() {
                aggregator.process_pending_feedback().await;
            }
        });

        event
    }

    /// Send the pending batch to the model now
    ///
    /// A call made while another flush is running returns `InFlight`
    /// without touching the batch. The batch is drained before the model
    /// call and is not retried if the call fails.
    pub async fn process_pending_feedback(&self) -> FlushOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("Feedback flush already running");
            return FlushOutcome::InFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.clear_pending_flag();

        if self.lock_batch().is_empty() {
            return FlushOutcome::Empty;
        }
        let Some(traits) = self.session.traits() else {
            tracing::debug!("No traits yet, holding feedback");
            return FlushOutcome::NoTraits;
        };
        let batch = std::mem::take(&mut *self.lock_batch());
        tracing::info!(events = batch.len(), "Revising traits from feedback");

        let message = match self.gateway.update_traits(&traits, &batch).await {
            Ok(ModelOutcome::Ready(revised)) => {
                tracing::debug!(genres = ?revised.genre, tempo = revised.tempo, "Traits revised");
                self.session.update(|state| state.traits = Some(revised));
                metrics::record_feedback_flush("applied");

                let outcome = match self.session.seed() {
                    Some(seed) => self.engine.generate(seed).await,
                    None => GenerationOutcome::Failed("No seed to regenerate".to_string()),
                };
                return FlushOutcome::Applied(outcome);
            }
            Ok(ModelOutcome::Failed { error, .. }) => {
                format!("Could not apply feedback: {}", error)
            }
            Err(e) => format!("Could not apply feedback: {}", e),
        };

        tracing::error!("{}", message);
        let now = self.clock.now_millis();
        self.session
            .update(|state| state.push_error(message.clone(), now));
        self.observer.on_error(&message);
        metrics::record_feedback_flush("failed");
        FlushOutcome::Failed(message)
    }

    /// Drop the pending batch without sending it
    ///
    /// # Returns
    ///
    /// Number of events discarded
    pub fn cancel_pending_feedback(&self) -> usize {
        self.debounce.cancel();
        let dropped = std::mem::take(&mut *self.lock_batch()).len();
        self.clear_pending_flag();
        if dropped > 0 {
            tracing::info!(dropped, "Discarded pending feedback");
        }
        dropped
    }

    /// Events waiting for the next flush
    pub fn pending_count(&self) -> usize {
        self.lock_batch().len()
    }

    fn clear_pending_flag(&self) {
        let was_pending = self.session.update(|state| {
            let pending = state.feedback_pending;
            state.feedback_pending = false;
            pending
        });
        if was_pending {
            self.observer
                .on_pending_changed(PendingKind::Feedback, false);
        }
    }

    fn lock_batch(&self) -> MutexGuard<'_, Vec<FeedbackEvent>> {
        self.batch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{EngineConfig, GatewayConfig};
    use crate::engine::observer::RecordingObserver;
    use crate::providers::ScriptedProvider;
    use crate::state::{CooldownStore, PreferenceStore};
    use crate::storage::MemoryStore;
    use crate::types::Seed;

    const TRAITS_JSON: &str = r#"{"genre":["folk"],"mood":"wistful","tempo":60,"lyricsTheme":"travel","instruments":["guitar"]}"#;
    const FASTER_JSON: &str = r#"{"genre":["folk"],"mood":"upbeat","tempo":70,"lyricsTheme":"travel","instruments":["guitar"]}"#;
    const SONGS: &str = r#"[{"title":"Wagon Wheel","artist":"Old Crow Medicine Show"},{"title":"Ho Hey","artist":"The Lumineers"}]"#;

    struct Fixture {
        aggregator: Arc<FeedbackAggregator>,
        engine: Arc<PlaylistEngine>,
        provider: Arc<ScriptedProvider>,
        session: Arc<Session>,
        observer: Arc<RecordingObserver>,
    }

    fn fixture(provider: ScriptedProvider) -> Fixture {
        let provider = Arc::new(provider);
        let clock = Arc::new(ManualClock::new(5_000));
        let gateway_config = GatewayConfig {
            max_calls_per_window: 100,
            ..GatewayConfig::default()
        };
        let gateway = Arc::new(
            ModelGateway::new(provider.clone(), &gateway_config, clock.clone()).unwrap(),
        );
        let session = Arc::new(Session::new(&EngineConfig::default()));
        let prefs = Arc::new(PreferenceStore::open(Arc::new(MemoryStore::new())).unwrap());
        let cooldowns = Arc::new(CooldownStore::new(prefs.clone(), clock.clone()));
        let observer = Arc::new(RecordingObserver::new());
        let engine = Arc::new(PlaylistEngine::new(
            gateway.clone(),
            session.clone(),
            prefs,
            cooldowns,
            observer.clone(),
            clock.clone(),
            Duration::from_secs(2),
        ));
        let aggregator = Arc::new(FeedbackAggregator::new(
            session.clone(),
            gateway,
            engine.clone(),
            observer.clone(),
            clock,
            Duration::from_secs(4),
        ));
        Fixture {
            aggregator,
            engine,
            provider,
            session,
            observer,
        }
    }

    fn provider() -> ScriptedProvider {
        ScriptedProvider::new(|prompt| {
            if prompt.starts_with("You are a music expert") {
                Ok(TRAITS_JSON.to_string())
            } else if prompt.starts_with("You are a music analyst") {
                Ok(FASTER_JSON.to_string())
            } else {
                Ok(SONGS.to_string())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_flushes_once() {
        let f = fixture(provider());
        f.engine.generate(Seed::text("folk").unwrap()).await;

        for value in [FeedbackValue::Positive, FeedbackValue::Negative, FeedbackValue::Positive] {
            f.aggregator
                .process("wagon_wheel_old_crow_medicine_show", FeedbackTrait::Speed, value);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        assert_eq!(f.aggregator.pending_count(), 3);
        assert!(f.session.snapshot().feedback_pending);

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(f.provider.calls_containing("You are a music analyst"), 1);
        assert_eq!(f.provider.calls_containing("You are a music curator"), 2);
        assert_eq!(f.session.traits().unwrap().tempo, 70);
        assert_eq!(f.aggregator.pending_count(), 0);
        assert!(!f.session.snapshot().feedback_pending);
        assert_eq!(f.session.snapshot().feedback_log.len(), 3);
    }

    #[tokio::test]
    async fn test_flush_without_traits_keeps_batch() {
        let f = fixture(provider());
        f.aggregator
            .process("a_b", FeedbackTrait::General, FeedbackValue::Positive);
        assert_eq!(
            f.aggregator.process_pending_feedback().await,
            FlushOutcome::NoTraits
        );
        assert_eq!(f.aggregator.pending_count(), 1);
        assert_eq!(f.provider.call_count(), 0);
        f.aggregator.cancel_pending_feedback();
    }

    #[tokio::test]
    async fn test_empty_flush_is_noop() {
        let f = fixture(provider());
        assert_eq!(
            f.aggregator.process_pending_feedback().await,
            FlushOutcome::Empty
        );
    }

    #[tokio::test]
    async fn test_failed_revision_drops_batch_and_reports() {
        let f = fixture(ScriptedProvider::new(|prompt| {
            if prompt.starts_with("You are a music expert") {
                Ok(TRAITS_JSON.to_string())
            } else if prompt.starts_with("You are a music analyst") {
                Ok("not json at all".to_string())
            } else {
                Ok(SONGS.to_string())
            }
        }));
        f.engine.generate(Seed::text("folk").unwrap()).await;
        f.aggregator
            .process("a_b", FeedbackTrait::Genre, FeedbackValue::Negative);

        let outcome = f.aggregator.process_pending_feedback().await;
        assert!(matches!(outcome, FlushOutcome::Failed(_)));
        assert_eq!(f.aggregator.pending_count(), 0);
        assert_eq!(f.session.traits().unwrap().tempo, 60);
        assert_eq!(f.observer.errors().len(), 1);
        f.aggregator.cancel_pending_feedback();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_batch() {
        let f = fixture(provider());
        f.engine.generate(Seed::text("folk").unwrap()).await;
        f.aggregator
            .process("a_b", FeedbackTrait::Lyrics, FeedbackValue::Positive);
        f.aggregator
            .process("a_b", FeedbackTrait::Topic, FeedbackValue::Negative);

        assert_eq!(f.aggregator.cancel_pending_feedback(), 2);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(f.provider.calls_containing("You are a music analyst"), 0);
        assert_eq!(f.session.snapshot().feedback_log.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_flush_is_ignored() {
        let f = fixture(provider().with_latency(Duration::from_secs(1)));
        f.engine.generate(Seed::text("folk").unwrap()).await;
        f.aggregator
            .process("a_b", FeedbackTrait::Time, FeedbackValue::Positive);
        f.aggregator.cancel_pending_feedback();
        f.aggregator
            .process("a_b", FeedbackTrait::Time, FeedbackValue::Positive);

        let first = {
            let aggregator = Arc::clone(&f.aggregator);
            tokio::spawn(async move { aggregator.process_pending_feedback().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            f.aggregator.process_pending_feedback().await,
            FlushOutcome::InFlight
        );
        assert!(matches!(first.await.unwrap(), FlushOutcome::Applied(_)));
        f.aggregator.cancel_pending_feedback();
    }
}
