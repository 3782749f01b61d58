//! Recommendation engine
//!
//! [`EngineBuilder`] wires the component graph (gateway, stores, session,
//! playlist engine, feedback aggregator) and hands back an
//! [`EngineFacade`], the only surface the presentation layer talks to.
//!
//! - [`playlist`]: single-flight generation and slider debounce
//! - [`feedback`]: debounced feedback batches
//! - [`fallback`]: offline recommendation sets
//! - [`observer`]: presentation callbacks

pub mod fallback;
pub mod feedback;
pub mod observer;
pub mod playlist;

pub use feedback::{FeedbackAggregator, FlushOutcome};
pub use observer::{EngineObserver, NoopObserver, ObservedEvent, PendingKind, RecordingObserver};
pub use playlist::{GenerationOutcome, PlaylistEngine};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Result, VibeError};
use crate::gateway::ModelGateway;
use crate::playback::{create_player, PlaybackProvider};
use crate::providers::{create_provider, ChatProvider};
use crate::state::{
    CooldownClass, CooldownDescription, CooldownRecord, CooldownStore, PreferenceStore,
    Preferences, Session, SessionState,
};
use crate::storage::{KeyValueStore, SledStore};
use crate::types::{FeedbackEvent, FeedbackTrait, FeedbackValue, PlayedSong, PlaylistEntry, Seed, SliderSet};

use std::sync::Arc;

/// Assembles an [`EngineFacade`]
///
/// Components not supplied explicitly are created from the configuration:
/// the chat provider from `provider`, a sled store at the storage path, the
/// player from `playback`, the system clock and a no-op observer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vinylvibe::config::Config;
/// use vinylvibe::engine::EngineBuilder;
/// use vinylvibe::providers::ScriptedProvider;
/// use vinylvibe::storage::MemoryStore;
///
/// let engine = EngineBuilder::new(Config::default())
///     .provider(Arc::new(ScriptedProvider::with_replies(Vec::<String>::new())))
///     .store(Arc::new(MemoryStore::new()))
///     .build()
///     .unwrap();
/// assert!(engine.get_state().playlist.is_empty());
/// ```
pub struct EngineBuilder {
    config: Config,
    provider: Option<Arc<dyn ChatProvider>>,
    store: Option<Arc<dyn KeyValueStore>>,
    observer: Arc<dyn EngineObserver>,
    clock: Arc<dyn Clock>,
    player: Option<Arc<dyn PlaybackProvider>>,
}

impl EngineBuilder {
    /// Start from `config`
    pub fn new(config: Config) -> Self {
        Self {
            config,
            provider: None,
            store: None,
            observer: Arc::new(NoopObserver),
            clock: Arc::new(SystemClock),
            player: None,
        }
    }

    /// Use `provider` instead of the configured one
    pub fn provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use `store` instead of the sled database
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Report to `observer`
    pub fn observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Read time from `clock`
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `player` instead of the configured one
    pub fn player(mut self, player: Arc<dyn PlaybackProvider>) -> Self {
        self.player = Some(player);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// Returns `VibeError::MissingCredentials` when the configured provider
    /// or player has no credentials, or a storage error when the preference
    /// database cannot be opened
    pub fn build(self) -> Result<EngineFacade> {
        let provider = match self.provider {
            Some(provider) => provider,
            None => create_provider(&self.config.provider)?,
        };
        let store: Arc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None => Arc::new(SledStore::open(self.config.storage.resolve_path()?)?),
        };
        let player = match self.player {
            Some(player) => Some(player),
            None => create_player(&self.config.playback)?,
        };

        let gateway = Arc::new(ModelGateway::new(
            provider,
            &self.config.gateway,
            Arc::clone(&self.clock),
        )?);
        let session = Arc::new(Session::new(&self.config.engine));
        let prefs = Arc::new(PreferenceStore::open(store)?);
        let cooldowns = Arc::new(CooldownStore::new(
            Arc::clone(&prefs),
            Arc::clone(&self.clock),
        ));
        let playlist = Arc::new(PlaylistEngine::new(
            Arc::clone(&gateway),
            Arc::clone(&session),
            Arc::clone(&prefs),
            Arc::clone(&cooldowns),
            Arc::clone(&self.observer),
            Arc::clone(&self.clock),
            self.config.engine.slider_debounce(),
        ));
        let feedback = Arc::new(FeedbackAggregator::new(
            Arc::clone(&session),
            Arc::clone(&gateway),
            Arc::clone(&playlist),
            Arc::clone(&self.observer),
            Arc::clone(&self.clock),
            self.config.engine.feedback_debounce(),
        ));

        tracing::info!(
            provider = gateway.provider_name(),
            playback = player.is_some(),
            "Engine ready"
        );

        Ok(EngineFacade {
            gateway,
            session,
            prefs,
            cooldowns,
            playlist,
            feedback,
            observer: self.observer,
            clock: self.clock,
            player,
        })
    }
}

/// Presentation-facing operations
pub struct EngineFacade {
    gateway: Arc<ModelGateway>,
    session: Arc<Session>,
    prefs: Arc<PreferenceStore>,
    cooldowns: Arc<CooldownStore>,
    playlist: Arc<PlaylistEngine>,
    feedback: Arc<FeedbackAggregator>,
    observer: Arc<dyn EngineObserver>,
    clock: Arc<dyn Clock>,
    player: Option<Arc<dyn PlaybackProvider>>,
}

impl std::fmt::Debug for EngineFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineFacade")
            .field("gateway", &self.gateway)
            .field("playlist", &self.playlist)
            .field("feedback", &self.feedback)
            .finish()
    }
}

impl EngineFacade {
    /// Generate a playlist from free text
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` for an empty seed. Model failures are
    /// reported through the outcome and the observer, not as errors.
    pub async fn generate_from_seed(&self, seed: &str) -> Result<GenerationOutcome> {
        let seed = Seed::text(seed)?;
        Ok(self.playlist.generate(seed).await)
    }

    /// Move one slider and schedule a regeneration
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` for an unknown slider or a value
    /// outside 0..=100; nothing is scheduled in that case
    pub fn handle_slider_change(&self, name: &str, value: i64) -> Result<SliderSet> {
        let sliders = self.prefs.set_slider(name, value)?;
        tracing::info!(slider = name, value, "Slider changed");
        self.playlist.update_from_sliders();
        Ok(sliders)
    }

    /// Restore default sliders and schedule a regeneration
    pub fn reset_sliders(&self) -> Result<SliderSet> {
        let sliders = self.prefs.reset_sliders()?;
        self.playlist.update_from_sliders();
        Ok(sliders)
    }

    /// Record a reaction to a song
    ///
    /// # Arguments
    ///
    /// * `song_id` - Cooldown key of the rated song
    /// * `trait_kind` - `general`, `lyrics`, `genre`, `speed`, `topic` or `time`
    /// * `value` - `+` or `-`
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` for an unknown trait or value
    pub fn handle_feedback(
        &self,
        song_id: &str,
        trait_kind: &str,
        value: &str,
    ) -> Result<FeedbackEvent> {
        let trait_kind: FeedbackTrait = trait_kind.parse()?;
        let value: FeedbackValue = value.parse()?;
        if song_id.trim().is_empty() {
            return Err(VibeError::Validation("song id cannot be empty".to_string()).into());
        }
        Ok(self.feedback.process(song_id, trait_kind, value))
    }

    /// Send pending feedback now instead of waiting for the quiet period
    pub async fn flush_feedback(&self) -> FlushOutcome {
        self.feedback.process_pending_feedback().await
    }

    /// Advance a song to the next cooldown class
    pub fn cycle_cooldown(&self, song_id: &str) -> Result<CooldownClass> {
        self.cooldowns.cycle_cooldown(song_id)
    }

    /// Assign a cooldown class by name
    pub fn set_cooldown(&self, song_id: &str, class: &str) -> Result<CooldownRecord> {
        self.cooldowns.set_cooldown_named(song_id, class)
    }

    /// Cooldown state for display
    pub fn describe_cooldown(&self, song_id: &str) -> CooldownDescription {
        self.cooldowns.describe(song_id)
    }

    /// Average daily plays over the last week
    pub fn play_frequency(&self, song_id: &str) -> String {
        self.cooldowns.play_frequency(song_id)
    }

    /// Play playlist entry `index`
    ///
    /// Moves the entry to the front, appends it to the listening history and
    /// counts the play against its cooldown.
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` when `index` is out of range
    pub fn play_song(&self, index: usize) -> Result<PlaylistEntry> {
        let now = self.clock.now_millis();
        let (entry, playlist) = self.session.update(|state| {
            let entry = state.promote(index)?;
            state.history.push(PlayedSong {
                title: entry.title.clone(),
                artist: entry.artist.clone(),
                played_at: now,
            });
            Ok::<_, anyhow::Error>((entry, state.playlist.clone()))
        })?;

        let record = self.cooldowns.record_play(&entry.song_id())?;
        tracing::info!(
            title = %entry.title,
            artist = %entry.artist,
            plays = record.play_count,
            "Now playing"
        );
        self.observer.on_playlist_updated(&playlist);
        Ok(entry)
    }

    /// Play entry `index` and start it on the external player
    ///
    /// # Returns
    ///
    /// The player's answer: `false` when the track could not be found or the
    /// player refused it
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Playback` when no player is configured, plus any
    /// error from [`play_song`](Self::play_song) or the player
    pub async fn play_on_device(&self, index: usize) -> Result<bool> {
        let Some(player) = self.player.clone() else {
            return Err(VibeError::Playback("playback is not configured".to_string()).into());
        };
        let entry = self.play_song(index)?;

        match player.search_track(&entry.title, &entry.artist).await? {
            Some(uri) => player.play(&uri).await,
            None => {
                tracing::warn!(title = %entry.title, "Track not found on {}", player.name());
                Ok(false)
            }
        }
    }

    /// Snapshot of the session
    pub fn get_state(&self) -> SessionState {
        self.session.snapshot()
    }

    /// Snapshot of the stored preferences
    pub fn get_preferences(&self) -> Preferences {
        self.prefs.snapshot()
    }

    /// Cancel both debounces without running their work
    pub fn cancel_pending(&self) {
        self.playlist.cancel_slider_update();
        self.feedback.cancel_pending_feedback();
    }

    /// Empty the session error log
    pub fn clear_errors(&self) {
        self.session.update(|state| state.errors.clear());
    }

    /// Name of the model provider
    pub fn provider_name(&self) -> &str {
        self.gateway.provider_name()
    }

    /// Whether a player is configured
    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }
}

impl Drop for EngineFacade {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
