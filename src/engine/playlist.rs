//! Playlist generation
//!
//! [`PlaylistEngine`] turns a seed into a playlist: interpret the seed into
//! traits when needed, ask the model for recommendations, filter them
//! through the cooldown table and publish the result to the session.
//!
//! Generation is single-flight. While a cycle runs, further requests are
//! parked in one queued slot (last write wins) and the running flight picks
//! the slot up when its cycle ends, so no two cycles ever overlap.

use crate::clock::Clock;
use crate::debounce::DebounceSlot;
use crate::engine::fallback::fallback_recommendations;
use crate::engine::observer::{EngineObserver, PendingKind};
use crate::gateway::{ModelGateway, ModelOutcome};
use crate::metrics;
use crate::state::{CooldownStore, PreferenceStore, Session};
use crate::types::{song_id, PlaylistEntry, Recommendation, Seed, Traits};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use ulid::Ulid;

/// Message shown while a cycle runs
pub const LOADING_MESSAGE: &str = "Generating playlist...";

/// How a call to [`PlaylistEngine::generate`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// The last cycle of the flight published this playlist
    Completed(Vec<PlaylistEntry>),
    /// The last cycle of the flight was aborted with this message
    Failed(String),
    /// Another flight was running; the seed was queued behind it
    Queued,
}

impl GenerationOutcome {
    /// The published playlist, if the flight completed
    pub fn playlist(&self) -> Option<&[PlaylistEntry]> {
        match self {
            GenerationOutcome::Completed(entries) => Some(entries),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Flight {
    generating: bool,
    queued: Option<Seed>,
}

/// Single-flight playlist generator
pub struct PlaylistEngine {
    gateway: Arc<ModelGateway>,
    session: Arc<Session>,
    prefs: Arc<PreferenceStore>,
    cooldowns: Arc<CooldownStore>,
    observer: Arc<dyn EngineObserver>,
    clock: Arc<dyn Clock>,
    slider_debounce: DebounceSlot,
    flight: Mutex<Flight>,
}

impl std::fmt::Debug for PlaylistEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistEngine")
            .field("gateway", &self.gateway)
            .field("flight", &*self.lock_flight())
            .finish()
    }
}

/// Resets the flight if the driving future is dropped mid-cycle
struct FlightGuard<'a> {
    engine: &'a PlaylistEngine,
    armed: bool,
}

impl FlightGuard<'_> {
    /// Take the queued seed, or end the flight when nothing is waiting
    fn next_or_finish(&mut self) -> Option<Seed> {
        let mut flight = self.engine.lock_flight();
        match flight.queued.take() {
            Some(seed) => Some(seed),
            None => {
                flight.generating = false;
                self.engine.session.update(|state| state.generating = false);
                self.armed = false;
                None
            }
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Generation cancelled mid-cycle, resetting flight");
            let mut flight = self.engine.lock_flight();
            flight.generating = false;
            flight.queued = None;
            self.engine.session.update(|state| state.generating = false);
            drop(flight);
            self.engine.observer.on_loading(None);
        }
    }
}

impl PlaylistEngine {
    /// Create an engine
    ///
    /// # Arguments
    ///
    /// * `gateway` - Model access
    /// * `session` - Session the playlist is published to
    /// * `prefs` - Slider source
    /// * `cooldowns` - Eligibility filter
    /// * `observer` - Presentation callbacks
    /// * `clock` - Time source for error timestamps
    /// * `slider_delay` - Quiet period before a slider change regenerates
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<ModelGateway>,
        session: Arc<Session>,
        prefs: Arc<PreferenceStore>,
        cooldowns: Arc<CooldownStore>,
        observer: Arc<dyn EngineObserver>,
        clock: Arc<dyn Clock>,
        slider_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            session,
            prefs,
            cooldowns,
            observer,
            clock,
            slider_debounce: DebounceSlot::new("slider", slider_delay),
            flight: Mutex::new(Flight::default()),
        }
    }

    /// Whether a flight is running
    pub fn is_generating(&self) -> bool {
        self.lock_flight().generating
    }

    /// Generate a playlist for `seed`
    ///
    /// If a flight is already running the seed replaces whatever was queued
    /// and `Queued` is returned immediately. Otherwise this call drives the
    /// flight, including any seeds queued while it runs, and returns the
    /// outcome of the last cycle.
    pub async fn generate(&self, seed: Seed) -> GenerationOutcome {
        {
            let mut flight = self.lock_flight();
            if flight.generating {
                tracing::info!(seed = %seed.value, "Generation in progress, queueing seed");
                flight.queued = Some(seed);
                return GenerationOutcome::Queued;
            }
            flight.generating = true;
            self.session.update(|state| state.generating = true);
        }

        let mut guard = FlightGuard {
            engine: self,
            armed: true,
        };
        let mut seed = seed;
        loop {
            let outcome = self.run_cycle(&seed).await;
            match guard.next_or_finish() {
                Some(next) => {
                    tracing::info!(seed = %next.value, "Starting queued generation");
                    seed = next;
                }
                None => {
                    self.observer.on_loading(None);
                    return outcome;
                }
            }
        }
    }

    async fn run_cycle(&self, seed: &Seed) -> GenerationOutcome {
        tracing::info!(seed = %seed.value, "Generating playlist");
        self.observer.on_loading(Some(LOADING_MESSAGE));

        let needs_interpretation = self.session.update(|state| {
            state.seed = Some(seed.clone());
            state.traits.is_none() || state.interpreted_seed.as_deref() != Some(seed.value.as_str())
        });

        if needs_interpretation {
            match self.gateway.interpret_seed(seed).await {
                Ok(ModelOutcome::Ready(traits)) => {
                    tracing::debug!(genres = ?traits.genre, mood = %traits.mood, "Interpreted seed");
                    self.session.update(|state| {
                        state.traits = Some(traits);
                        state.interpreted_seed = Some(seed.value.clone());
                    });
                }
                Ok(ModelOutcome::Failed { error, .. }) => {
                    return self.fail(format!("Could not interpret seed: {}", error));
                }
                Err(e) => return self.fail(format!("Could not interpret seed: {}", e)),
            }
        } else {
            tracing::debug!("Seed unchanged, reusing traits");
        }

        let Some(traits) = self.session.traits() else {
            return self.fail("No traits available for generation".to_string());
        };
        let sliders = self.prefs.sliders();
        let history = self.session.history();

        let recommendations = match self
            .gateway
            .generate_recommendations(&traits, &sliders, &history)
            .await
        {
            Ok(ModelOutcome::Ready(list)) if list.iter().any(Recommendation::is_identifiable) => {
                list
            }
            Ok(ModelOutcome::Ready(_)) => {
                tracing::warn!("Model returned no usable songs");
                fallback_recommendations(&seed.value, Some(&traits))
            }
            Ok(ModelOutcome::Failed { error, .. }) => {
                tracing::warn!("Recommendations unusable: {}", error);
                fallback_recommendations(&seed.value, Some(&traits))
            }
            Err(e) => return self.fail(format!("Could not generate recommendations: {}", e)),
        };

        let selected = self.process_playlist(recommendations);
        let entries = build_entries(selected, seed, &traits);

        self.session
            .update(|state| state.replace_playlist(entries.clone()));
        self.observer.on_playlist_updated(&entries);
        metrics::record_generation("completed");
        tracing::info!(songs = entries.len(), "Playlist updated");

        GenerationOutcome::Completed(entries)
    }

    /// Filter candidates down to the playlist
    ///
    /// Drops untitled candidates, removes duplicates by song id and removes
    /// songs whose cooldown is active. When that leaves nothing although
    /// candidates existed, the first candidate is kept so a playlist is
    /// never empty.
    pub fn process_playlist(&self, raw: Vec<Recommendation>) -> Vec<Recommendation> {
        let first_raw = raw.first().cloned();

        let mut seen = HashSet::new();
        let candidates: Vec<Recommendation> = raw
            .into_iter()
            .filter(Recommendation::is_identifiable)
            .filter(|rec| seen.insert(recommendation_id(rec)))
            .collect();

        let eligible: Vec<Recommendation> = candidates
            .iter()
            .filter(|rec| self.cooldowns.is_eligible(&recommendation_id(rec)))
            .cloned()
            .collect();

        if !eligible.is_empty() {
            let held_back = candidates.len() - eligible.len();
            if held_back > 0 {
                tracing::debug!(held_back, "Filtered songs on cooldown");
            }
            return eligible;
        }

        match candidates.into_iter().next().or(first_raw) {
            Some(first) => {
                tracing::info!("Every candidate is on cooldown, keeping the first");
                vec![first]
            }
            None => Vec::new(),
        }
    }

    /// Schedule a regeneration after the slider quiet period
    ///
    /// Each call restarts the timer. When it fires, the current seed is
    /// regenerated; without a seed nothing happens.
    pub fn update_from_sliders(self: &Arc<Self>) {
        self.session.update(|state| state.slider_pending = true);
        self.observer.on_pending_changed(PendingKind::Sliders, true);

        let engine: Weak<Self> = Arc::downgrade(self);
        self.slider_debounce.schedule(async move {
            let Some(engine) = engine.upgrade() else {
                return;
            };
            engine.session.update(|state| state.slider_pending = false);
            engine
                .observer
                .on_pending_changed(PendingKind::Sliders, false);
            match engine.session.seed() {
                Some(seed) => {
                    engine.generate(seed).await;
                }
                None => tracing::debug!("Sliders changed without a seed, nothing to regenerate"),
            }
        });
    }

    /// Drop a pending slider regeneration
    ///
    /// # Returns
    ///
    /// `true` if a regeneration was waiting
    pub fn cancel_slider_update(&self) -> bool {
        let cancelled = self.slider_debounce.cancel();
        let was_pending = self.session.update(|state| {
            let pending = state.slider_pending;
            state.slider_pending = false;
            pending
        });
        if was_pending {
            self.observer
                .on_pending_changed(PendingKind::Sliders, false);
        }
        cancelled
    }

    /// Whether a slider regeneration is waiting for its quiet period
    pub fn slider_update_pending(&self) -> bool {
        self.slider_debounce.is_waiting()
    }

    fn fail(&self, message: String) -> GenerationOutcome {
        tracing::error!("{}", message);
        let now = self.clock.now_millis();
        self.session.update(|state| state.push_error(message.clone(), now));
        self.observer.on_error(&message);
        metrics::record_generation("failed");
        GenerationOutcome::Failed(message)
    }

    fn lock_flight(&self) -> MutexGuard<'_, Flight> {
        self.flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn recommendation_id(rec: &Recommendation) -> String {
    song_id(
        rec.title.as_deref().unwrap_or_default(),
        rec.artist.as_deref().unwrap_or_default(),
    )
}

/// Turn selected recommendations into playlist entries
fn build_entries(selected: Vec<Recommendation>, seed: &Seed, traits: &Traits) -> Vec<PlaylistEntry> {
    selected
        .into_iter()
        .enumerate()
        .map(|(index, rec)| PlaylistEntry {
            id: format!("song-{}", Ulid::new()),
            title: rec.title.unwrap_or_else(|| format!("Song {}", index + 1)),
            artist: rec.artist.unwrap_or_else(|| "Unknown Artist".to_string()),
            reason: rec
                .reason
                .filter(|reason| !reason.is_empty())
                .unwrap_or_else(|| format!("Matches your {}: {}", seed.kind, seed.value)),
            traits_snapshot: Some(traits.clone()),
            seed_value: seed.value.clone(),
            feedback: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{EngineConfig, GatewayConfig};
    use crate::engine::observer::RecordingObserver;
    use crate::providers::ScriptedProvider;
    use crate::state::CooldownClass;
    use crate::storage::MemoryStore;
    use crate::types::DEFAULT_REASON;

    const TRAITS_JSON: &str = r#"{"genre":["folk"],"mood":"wistful","tempo":60,"lyricsTheme":"travel","instruments":["guitar"]}"#;
    const FIVE_SONGS: &str = r#"[
        {"title":"Wagon Wheel","artist":"Old Crow Medicine Show","reason":"road song"},
        {"title":"Home","artist":"Edward Sharpe"},
        {"title":"Ho Hey","artist":"The Lumineers"},
        {"title":"Little Lion Man","artist":"Mumford & Sons"},
        {"title":"Skinny Love","artist":"Bon Iver"}
    ]"#;

    struct Fixture {
        engine: Arc<PlaylistEngine>,
        provider: Arc<ScriptedProvider>,
        observer: Arc<RecordingObserver>,
        session: Arc<Session>,
        prefs: Arc<PreferenceStore>,
        cooldowns: Arc<CooldownStore>,
    }

    fn fixture(provider: ScriptedProvider) -> Fixture {
        let provider = Arc::new(provider);
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(1_000_000));
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
            gateway,
            session.clone(),
            prefs.clone(),
            cooldowns.clone(),
            observer.clone(),
            clock,
            Duration::from_secs(2),
        ));
        Fixture {
            engine,
            provider,
            observer,
            session,
            prefs,
            cooldowns,
        }
    }

    fn folk_provider() -> ScriptedProvider {
        ScriptedProvider::new(|prompt| {
            if prompt.starts_with("You are a music expert") {
                Ok(TRAITS_JSON.to_string())
            } else {
                Ok(FIVE_SONGS.to_string())
            }
        })
    }

    fn seed(value: &str) -> Seed {
        Seed::text(value).unwrap()
    }

    #[tokio::test]
    async fn test_generate_builds_playlist() {
        let f = fixture(folk_provider());
        let outcome = f.engine.generate(seed("folk road trip")).await;
        let playlist = outcome.playlist().unwrap();

        assert_eq!(playlist.len(), 5);
        assert_eq!(playlist[0].title, "Wagon Wheel");
        assert_eq!(playlist[1].reason, DEFAULT_REASON);
        assert!(playlist.iter().all(|entry| entry.id.starts_with("song-")));
        assert!(playlist[0].traits_snapshot.as_ref().unwrap().mentions_genre("folk"));

        let state = f.session.snapshot();
        assert_eq!(state.cursor, 0);
        assert!(!state.generating);
        assert_eq!(f.observer.playlists().len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_seed_skips_interpretation() {
        let f = fixture(folk_provider());
        f.engine.generate(seed("folk road trip")).await;
        f.engine.generate(seed("folk road trip")).await;
        assert_eq!(f.provider.calls_containing("You are a music expert"), 1);
        // Same traits, sliders and history are answered from the cache
        assert_eq!(f.provider.calls_containing("You are a music curator"), 1);

        f.engine.generate(seed("rainy jazz")).await;
        assert_eq!(f.provider.calls_containing("You are a music expert"), 2);
    }

    #[tokio::test]
    async fn test_failed_interpretation_keeps_playlist() {
        let f = fixture(ScriptedProvider::new(|prompt| {
            if prompt.contains("\"gibberish\"") {
                Ok(r#"{"error":"no idea"}"#.to_string())
            } else if prompt.starts_with("You are a music expert") {
                Ok(TRAITS_JSON.to_string())
            } else {
                Ok(FIVE_SONGS.to_string())
            }
        }));
        f.engine.generate(seed("folk")).await;
        let outcome = f.engine.generate(seed("gibberish")).await;

        assert!(matches!(outcome, GenerationOutcome::Failed(_)));
        assert_eq!(f.session.snapshot().playlist.len(), 5);
        assert_eq!(f.session.snapshot().errors.len(), 1);
        assert_eq!(f.observer.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_without_fallback() {
        let f = fixture(ScriptedProvider::new(|prompt| {
            if prompt.starts_with("You are a music expert") {
                Ok(TRAITS_JSON.to_string())
            } else {
                Err(crate::error::VibeError::Transport("connection reset".to_string()).into())
            }
        }));
        let outcome = f.engine.generate(seed("folk")).await;
        assert!(matches!(outcome, GenerationOutcome::Failed(message) if message.contains("connection reset")));
        assert!(f.session.snapshot().playlist.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_recommendations_use_fallback() {
        let f = fixture(ScriptedProvider::new(|prompt| {
            if prompt.starts_with("You are a music expert") {
                Ok(r#"{"genre":["jazz"],"mood":"cool","tempo":40,"lyricsTheme":"night","instruments":[]}"#.to_string())
            } else {
                Ok("I would suggest listening to something relaxing.".to_string())
            }
        }));
        let outcome = f.engine.generate(seed("late night")).await;
        let playlist = outcome.playlist().unwrap();
        assert_eq!(playlist.len(), 5);
        assert_eq!(playlist[0].title, "Take Five");
    }

    #[tokio::test]
    async fn test_all_on_cooldown_keeps_first() {
        let f = fixture(folk_provider());
        for (title, artist) in [
            ("Wagon Wheel", "Old Crow Medicine Show"),
            ("Home", "Edward Sharpe"),
            ("Ho Hey", "The Lumineers"),
            ("Little Lion Man", "Mumford & Sons"),
            ("Skinny Love", "Bon Iver"),
        ] {
            f.cooldowns
                .set_cooldown(&song_id(title, artist), CooldownClass::Long)
                .unwrap();
        }

        let outcome = f.engine.generate(seed("folk")).await;
        let playlist = outcome.playlist().unwrap();
        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist[0].title, "Wagon Wheel");
    }

    #[test]
    fn test_process_playlist_dedupes_and_drops_untitled() {
        let f = fixture(folk_provider());
        let raw = vec![
            Recommendation::new("Jolene", "Dolly Parton", "x"),
            Recommendation {
                title: None,
                artist: Some("Nobody".to_string()),
                reason: None,
            },
            Recommendation::new("  JOLENE ", "dolly  parton", "dupe"),
            Recommendation::new("Ring of Fire", "Johnny Cash", "y"),
        ];
        let kept = f.engine.process_playlist(raw);
        let titles: Vec<_> = kept.iter().map(|r| r.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["Jolene", "Ring of Fire"]);
        assert!(f.engine.process_playlist(Vec::new()).is_empty());
    }

    #[test]
    fn test_build_entries_placeholders() {
        let traits = Traits::from_model_value(&serde_json::from_str(TRAITS_JSON).unwrap()).unwrap();
        let entries = build_entries(
            vec![Recommendation {
                title: None,
                artist: None,
                reason: None,
            }],
            &seed("folk"),
            &traits,
        );
        assert_eq!(entries[0].title, "Song 1");
        assert_eq!(entries[0].artist, "Unknown Artist");
        assert_eq!(entries[0].reason, "Matches your text: folk");
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_runs_latest_queued_seed() {
        let f = fixture(folk_provider().with_latency(Duration::from_millis(500)));

        let first = {
            let engine = Arc::clone(&f.engine);
            tokio::spawn(async move { engine.generate(seed("alpha")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(f.engine.is_generating());

        assert_eq!(f.engine.generate(seed("bravo")).await, GenerationOutcome::Queued);
        assert_eq!(f.engine.generate(seed("charlie")).await, GenerationOutcome::Queued);

        let outcome = first.await.unwrap();
        assert!(outcome.playlist().is_some());
        assert_eq!(f.provider.calls_containing("\"alpha\""), 1);
        assert_eq!(f.provider.calls_containing("\"bravo\""), 0);
        assert_eq!(f.provider.calls_containing("\"charlie\""), 1);
        assert_eq!(f.session.seed().unwrap().value, "charlie");
        assert!(!f.engine.is_generating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_flight_resets() {
        let f = fixture(folk_provider().with_latency(Duration::from_secs(5)));
        let engine = Arc::clone(&f.engine);
        let handle = tokio::spawn(async move { engine.generate(seed("alpha")).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(f.engine.is_generating());

        handle.abort();
        let _ = handle.await;
        assert!(!f.engine.is_generating());
        assert!(!f.session.snapshot().generating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slider_debounce_regenerates_once() {
        let f = fixture(folk_provider());
        f.engine.generate(seed("folk")).await;
        let before = f.provider.calls_containing("You are a music curator");

        for value in [10, 20, 30] {
            f.prefs.set_slider("artistFame", value).unwrap();
            f.engine.update_from_sliders();
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert!(f.session.snapshot().slider_pending);
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(
            f.provider.calls_containing("You are a music curator"),
            before + 1
        );
        assert!(!f.session.snapshot().slider_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_slider_update() {
        let f = fixture(folk_provider());
        f.engine.generate(seed("folk")).await;
        f.engine.update_from_sliders();
        assert!(f.engine.slider_update_pending());
        assert!(f.engine.cancel_slider_update());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(f.provider.calls_containing("You are a music curator"), 1);
        assert!(!f.session.snapshot().slider_pending);
    }
}
