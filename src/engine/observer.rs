//! Presentation callbacks
//!
//! The engine never renders anything. It reports through an
//! [`EngineObserver`] supplied at construction.

use crate::types::PlaylistEntry;
use std::sync::Mutex;

/// Which debounce a pending notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// Slider-triggered regeneration
    Sliders,
    /// Feedback batch flush
    Feedback,
}

/// Receiver of engine notifications
///
/// Callbacks run synchronously on the engine task and must not block.
pub trait EngineObserver: Send + Sync {
    /// A new playlist replaced the previous one
    fn on_playlist_updated(&self, playlist: &[PlaylistEntry]);

    /// A failure was reported
    fn on_error(&self, message: &str);

    /// A debounce started or ended
    fn on_pending_changed(&self, _kind: PendingKind, _pending: bool) {}

    /// Loading started with a message, or ended with `None`
    fn on_loading(&self, _message: Option<&str>) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {
    fn on_playlist_updated(&self, _playlist: &[PlaylistEntry]) {}

    fn on_error(&self, _message: &str) {}
}

/// One notification captured by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    /// Playlist titles in order
    PlaylistUpdated(Vec<String>),
    /// Error message
    Error(String),
    /// Debounce state change
    Pending(PendingKind, bool),
    /// Loading state change
    Loading(Option<String>),
}

/// Observer that records every notification, for tests and scripting
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event so far
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.lock().clone()
    }

    /// Playlist updates so far, as title lists
    pub fn playlists(&self) -> Vec<Vec<String>> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::PlaylistUpdated(titles) => Some(titles.clone()),
                _ => None,
            })
            .collect()
    }

    /// Error messages so far
    pub fn errors(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObservedEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ObservedEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EngineObserver for RecordingObserver {
    fn on_playlist_updated(&self, playlist: &[PlaylistEntry]) {
        self.push(ObservedEvent::PlaylistUpdated(
            playlist.iter().map(|entry| entry.title.clone()).collect(),
        ));
    }

    fn on_error(&self, message: &str) {
        self.push(ObservedEvent::Error(message.to_string()));
    }

    fn on_pending_changed(&self, kind: PendingKind, pending: bool) {
        self.push(ObservedEvent::Pending(kind, pending));
    }

    fn on_loading(&self, message: Option<&str>) {
        self.push(ObservedEvent::Loading(message.map(str::to_string)));
    }
}
