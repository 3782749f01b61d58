//! Spotify Web API player
//!
//! Resolves songs to track URIs through the search endpoint and drives the
//! user's active device. The access token is refreshed transparently when
//! it is within a minute of expiry.

use crate::config::PlaybackConfig;
use crate::error::{Result, VibeError};
use crate::playback::token::{PlaybackToken, TokenResponse};
use crate::playback::{PlaybackProvider, PlaybackState, TrackInfo};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Web API client implementing [`PlaybackProvider`]
///
/// # Examples
///
/// ```no_run
/// use vinylvibe::config::PlaybackConfig;
/// use vinylvibe::playback::{PlaybackProvider, SpotifyPlayer};
///
/// # async fn example() -> vinylvibe::error::Result<()> {
/// let config = PlaybackConfig {
///     access_token: Some("BQD...".to_string()),
///     ..PlaybackConfig::default()
/// };
/// let player = SpotifyPlayer::new(&config)?;
/// if let Some(uri) = player.search_track("Jolene", "Dolly Parton").await? {
///     player.play(&uri).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct SpotifyPlayer {
    client: Client,
    api_base: String,
    accounts_base: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    device_id: Option<String>,
    token: Mutex<PlaybackToken>,
}

impl std::fmt::Debug for SpotifyPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyPlayer")
            .field("api_base", &self.api_base)
            .field("device_id", &self.device_id)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    uri: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ArtistItem>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(default)]
    is_playing: bool,
    item: Option<TrackItem>,
    device: Option<DeviceItem>,
}

#[derive(Debug, Deserialize)]
struct DeviceItem {
    id: Option<String>,
}

impl From<TrackItem> for TrackInfo {
    fn from(item: TrackItem) -> Self {
        TrackInfo {
            uri: item.uri,
            name: item.name,
            artist: item
                .artists
                .into_iter()
                .map(|artist| artist.name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl SpotifyPlayer {
    /// Create a player from configuration
    ///
    /// # Errors
    ///
    /// Returns `VibeError::MissingCredentials` when neither an access token
    /// nor a refresh token is configured
    pub fn new(config: &PlaybackConfig) -> Result<Self> {
        let token = PlaybackToken::from_parts(
            config.access_token.clone(),
            config.refresh_token.clone(),
        );
        if token.access_token.is_empty() && token.refresh_token.is_none() {
            return Err(VibeError::MissingCredentials(
                "playback: no access or refresh token. Set VINYLVIBE_SPOTIFY_ACCESS_TOKEN"
                    .to_string(),
            )
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("vinylvibe/0.1.0")
            .build()
            .map_err(|e| VibeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Spotify player: api_base={}", config.api_base);

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            accounts_base: config.accounts_base.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            device_id: config.device_id.clone(),
            token: Mutex::new(token),
        })
    }

    /// Current token state
    pub fn token(&self) -> PlaybackToken {
        self.lock_token().clone()
    }

    /// Access token usable right now, refreshing first if needed
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Authentication` if the token is expired and
    /// cannot be refreshed
    pub async fn access_token(&self) -> Result<String> {
        let current = self.token();
        if !current.is_expired() {
            return Ok(current.access_token);
        }
        let Some(refresh_token) = current.refresh_token.clone() else {
            return Err(VibeError::Authentication(
                "access token expired and no refresh token is available".to_string(),
            )
            .into());
        };

        let refreshed = self.refresh(&refresh_token).await?;
        let access_token = refreshed.access_token.clone();
        *self.lock_token() = refreshed;
        Ok(access_token)
    }

    /// Exchange `refresh_token` for a new token
    async fn refresh(&self, refresh_token: &str) -> Result<PlaybackToken> {
        tracing::info!("Refreshing playback access token");
        let client_id = self.client_id.clone().unwrap_or_default();

        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_base))
            .basic_auth(client_id, self.client_secret.as_ref())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| {
                VibeError::Authentication(format!("refresh token request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token refresh rejected: {} {}", status, body);
            return Err(VibeError::Authentication(format!(
                "refresh token endpoint returned {}: {}",
                status, body
            ))
            .into());
        }

        let raw: TokenResponse = response.json().await.map_err(|e| {
            VibeError::Authentication(format!("failed to parse refresh token response: {}", e))
        })?;
        Ok(raw.into_token(Some(refresh_token.to_string())))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn lock_token(&self) -> MutexGuard<'_, PlaybackToken> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Map a non-success Web API status to an error
fn status_error(status: StatusCode, body: String) -> anyhow::Error {
    if status == StatusCode::UNAUTHORIZED {
        VibeError::Authentication(format!("playback API rejected the token: {}", body)).into()
    } else {
        VibeError::Playback(format!("playback API returned {}: {}", status, body)).into()
    }
}

fn transport_error(e: reqwest::Error) -> anyhow::Error {
    VibeError::Playback(format!("playback request failed: {}", e)).into()
}

#[async_trait]
impl PlaybackProvider for SpotifyPlayer {
    async fn play(&self, uri: &str) -> Result<bool> {
        let token = self.access_token().await?;
        let mut request = self
            .client
            .put(self.url("/v1/me/player/play"))
            .bearer_auth(token)
            .json(&json!({ "uris": [uri] }));
        if let Some(device_id) = &self.device_id {
            request = request.query(&[("device_id", device_id)]);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            tracing::info!(uri, "Playback started");
            return Ok(true);
        }
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(uri, "Playback refused: {} {}", status, body);
        Ok(false)
    }

    async fn playback_state(&self) -> Result<PlaybackState> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.url("/v1/me/player"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(PlaybackState::default());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let player: PlayerResponse = response
            .json()
            .await
            .map_err(|e| VibeError::Playback(format!("invalid player state: {}", e)))?;
        Ok(PlaybackState {
            is_playing: player.is_playing,
            track: player.item.map(TrackInfo::from),
            device_id: player.device.and_then(|device| device.id),
        })
    }

    async fn transfer(&self, device_id: &str) -> Result<()> {
        let token = self.access_token().await?;
        let response = self
            .client
            .put(self.url("/v1/me/player"))
            .bearer_auth(token)
            .json(&json!({ "device_ids": [device_id], "play": false }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        tracing::info!(device_id, "Playback transferred");
        Ok(())
    }

    async fn search_track(&self, title: &str, artist: &str) -> Result<Option<String>> {
        let token = self.access_token().await?;
        let query = format!("track:{} artist:{}", title, artist);
        let response = self
            .client
            .get(self.url("/v1/search"))
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| VibeError::Playback(format!("invalid search response: {}", e)))?;
        let uri = results
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .map(|item| item.uri);
        tracing::debug!(title, artist, found = uri.is_some(), "Track search");
        Ok(uri)
    }

    fn name(&self) -> &str {
        "spotify"
    }
}
