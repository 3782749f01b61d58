//! In-memory listening session
//!
//! [`SessionState`] holds everything about the current session that is not
//! durable: the seed, the interpreted traits, the playlist with its play
//! cursor, and the bounded feedback, history and error logs. [`Session`]
//! shares it behind a mutex that is never held across an `.await`.

use crate::bounded::BoundedLog;
use crate::config::EngineConfig;
use crate::error::{Result, VibeError};
use crate::types::{ErrorRecord, FeedbackEvent, PlayedSong, PlaylistEntry, Seed, Traits};

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

/// Snapshot-able session data
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Seed of the current or last generation
    pub seed: Option<Seed>,
    /// Traits in effect
    pub traits: Option<Traits>,
    /// Seed value the current traits were interpreted from
    pub interpreted_seed: Option<String>,
    /// Current playlist; index 0 is now playing
    pub playlist: Vec<PlaylistEntry>,
    /// Index of the now-playing entry
    pub cursor: usize,
    /// Most recent feedback events
    pub feedback_log: BoundedLog<FeedbackEvent>,
    /// Most recently played songs
    pub history: BoundedLog<PlayedSong>,
    /// Most recent reported errors
    pub errors: BoundedLog<ErrorRecord>,
    /// A slider-triggered regeneration is waiting for its debounce
    pub slider_pending: bool,
    /// Feedback is waiting for its debounce
    pub feedback_pending: bool,
    /// A generation cycle is running
    pub generating: bool,
}

impl SessionState {
    /// Empty session with log capacities from `config`
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            seed: None,
            traits: None,
            interpreted_seed: None,
            playlist: Vec::new(),
            cursor: 0,
            feedback_log: BoundedLog::new(config.feedback_log_capacity),
            history: BoundedLog::new(config.history_capacity),
            errors: BoundedLog::new(config.error_log_capacity),
            slider_pending: false,
            feedback_pending: false,
            generating: false,
        }
    }

    /// Swap in a freshly generated playlist and rewind the cursor
    pub fn replace_playlist(&mut self, entries: Vec<PlaylistEntry>) {
        self.playlist = entries;
        self.cursor = 0;
    }

    /// Entry under the play cursor
    pub fn now_playing(&self) -> Option<&PlaylistEntry> {
        self.playlist.get(self.cursor)
    }

    /// Move entry `index` to the front and make it the now-playing entry
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` if `index` is out of range
    pub fn promote(&mut self, index: usize) -> Result<PlaylistEntry> {
        if index >= self.playlist.len() {
            return Err(VibeError::Validation(format!(
                "no song at position {} (playlist has {})",
                index,
                self.playlist.len()
            ))
            .into());
        }
        if index > 0 {
            let entry = self.playlist.remove(index);
            self.playlist.insert(0, entry);
        }
        self.cursor = 0;
        Ok(self.playlist[0].clone())
    }

    /// Log a feedback event and attach it to matching playlist entries
    pub fn record_feedback(&mut self, event: FeedbackEvent) {
        for entry in self
            .playlist
            .iter_mut()
            .filter(|entry| entry.song_id() == event.song_id)
        {
            entry.feedback.push(event.clone());
        }
        self.feedback_log.push(event);
    }

    /// Append to the error log
    pub fn push_error(&mut self, message: impl Into<String>, timestamp: i64) {
        self.errors.push(ErrorRecord {
            message: message.into(),
            timestamp,
        });
    }
}

/// Shared handle to the session
#[derive(Debug)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    /// Create an empty session
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: Mutex::new(SessionState::new(config)),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Read from the state
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate the state
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Current seed
    pub fn seed(&self) -> Option<Seed> {
        self.read(|state| state.seed.clone())
    }

    /// Current traits
    pub fn traits(&self) -> Option<Traits> {
        self.read(|state| state.traits.clone())
    }

    /// Listening history, oldest first
    pub fn history(&self) -> Vec<PlayedSong> {
        self.read(|state| state.history.to_vec())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeedbackTrait, FeedbackValue};

    fn entry(title: &str) -> PlaylistEntry {
        PlaylistEntry {
            id: format!("song-{}", title),
            title: title.to_string(),
            artist: "Artist".to_string(),
            reason: "because".to_string(),
            traits_snapshot: None,
            seed_value: "seed".to_string(),
            feedback: Vec::new(),
        }
    }

    fn state() -> SessionState {
        SessionState::new(&EngineConfig::default())
    }

    #[test]
    fn test_replace_playlist_rewinds_cursor() {
        let mut state = state();
        state.replace_playlist(vec![entry("a"), entry("b")]);
        state.promote(1).unwrap();
        state.replace_playlist(vec![entry("c")]);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.now_playing().unwrap().title, "c");
    }

    #[test]
    fn test_promote_moves_entry_to_front() {
        let mut state = state();
        state.replace_playlist(vec![entry("a"), entry("b"), entry("c")]);
        let played = state.promote(2).unwrap();
        assert_eq!(played.title, "c");
        let titles: Vec<_> = state.playlist.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_promote_out_of_range() {
        let mut state = state();
        state.replace_playlist(vec![entry("a")]);
        assert!(state.promote(1).is_err());
        assert!(state.promote(0).is_ok());
    }

    #[test]
    fn test_record_feedback_attaches_to_entry() {
        let mut state = state();
        state.replace_playlist(vec![entry("a"), entry("b")]);
        let song_id = state.playlist[1].song_id();
        state.record_feedback(FeedbackEvent {
            song_id,
            trait_kind: FeedbackTrait::General,
            value: FeedbackValue::Positive,
            timestamp: 1,
        });
        assert!(state.playlist[0].feedback.is_empty());
        assert_eq!(state.playlist[1].feedback.len(), 1);
        assert_eq!(state.feedback_log.len(), 1);
    }

    #[test]
    fn test_logs_are_bounded() {
        let mut state = state();
        for i in 0..15 {
            state.push_error(format!("error {}", i), i);
        }
        assert_eq!(state.errors.len(), 10);
        assert_eq!(state.errors.latest().unwrap().message, "error 14");
    }

    #[test]
    fn test_session_update_and_snapshot() {
        let session = Session::new(&EngineConfig::default());
        session.update(|state| state.seed = Some(Seed::text("jazz").unwrap()));
        assert_eq!(session.seed().unwrap().value, "jazz");
        assert!(session.traits().is_none());
        assert!(session.snapshot().playlist.is_empty());
        assert!(session.history().is_empty());
    }
}
