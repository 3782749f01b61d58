//! Streaming playback
//!
//! The engine hands off actual audio to an external player. A
//! [`PlaybackProvider`] resolves songs to provider URIs and starts them on
//! the user's device.

pub mod spotify;
pub mod token;

pub use spotify::SpotifyPlayer;
pub use token::PlaybackToken;

use crate::config::PlaybackConfig;
use crate::error::Result;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Track currently loaded on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Provider URI
    pub uri: String,
    /// Track name
    pub name: String,
    /// Comma-separated artist names
    pub artist: String,
}

/// Snapshot of the remote player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Whether audio is playing
    pub is_playing: bool,
    /// Loaded track, if any
    pub track: Option<TrackInfo>,
    /// Active device
    pub device_id: Option<String>,
}

/// External streaming player
#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    /// Start playing `uri`
    ///
    /// # Returns
    ///
    /// `true` if the provider accepted the request, `false` if it refused
    /// it (for example no active device)
    async fn play(&self, uri: &str) -> Result<bool>;

    /// Current player state
    async fn playback_state(&self) -> Result<PlaybackState>;

    /// Move playback to another device
    async fn transfer(&self, device_id: &str) -> Result<()>;

    /// Resolve a song to a playable URI
    async fn search_track(&self, title: &str, artist: &str) -> Result<Option<String>>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Build the configured player
///
/// # Returns
///
/// `None` when playback is disabled
///
/// # Errors
///
/// Returns `VibeError::MissingCredentials` when playback is enabled without
/// any token
pub fn create_player(config: &PlaybackConfig) -> Result<Option<Arc<dyn PlaybackProvider>>> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(SpotifyPlayer::new(config)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_playback_builds_nothing() {
        assert!(create_player(&PlaybackConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_enabled_playback_needs_token() {
        let config = PlaybackConfig {
            enabled: true,
            ..PlaybackConfig::default()
        };
        assert!(create_player(&config).is_err());

        let config = PlaybackConfig {
            enabled: true,
            access_token: Some("tok".to_string()),
            ..PlaybackConfig::default()
        };
        assert_eq!(create_player(&config).unwrap().unwrap().name(), "spotify");
    }
}
