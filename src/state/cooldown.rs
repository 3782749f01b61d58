//! Per-song cooldowns
//!
//! A cooldown keeps a recently played or explicitly throttled song out of
//! new playlists for a class-dependent duration. Records live in the
//! [`PreferenceStore`] and are never deleted.

use crate::clock::Clock;
use crate::error::{Result, VibeError};
use crate::state::preferences::PreferenceStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Cooldown length class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CooldownClass {
    /// One day
    #[serde(alias = "rabbit")]
    Short,
    /// Two days
    #[default]
    #[serde(alias = "default")]
    Medium,
    /// Three days
    #[serde(alias = "turtle")]
    Long,
}

impl CooldownClass {
    /// Window length in seconds
    pub fn duration_seconds(&self) -> u64 {
        match self {
            CooldownClass::Short => 86_400,
            CooldownClass::Medium => 172_800,
            CooldownClass::Long => 259_200,
        }
    }

    /// Display icon
    pub fn icon(&self) -> &'static str {
        match self {
            CooldownClass::Short => "🐇",
            CooldownClass::Medium => "⏳",
            CooldownClass::Long => "🐢",
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            CooldownClass::Short => "short",
            CooldownClass::Medium => "medium",
            CooldownClass::Long => "long",
        }
    }

    /// Next class in the short, medium, long rotation
    pub fn next(&self) -> Self {
        match self {
            CooldownClass::Short => CooldownClass::Medium,
            CooldownClass::Medium => CooldownClass::Long,
            CooldownClass::Long => CooldownClass::Short,
        }
    }
}

impl fmt::Display for CooldownClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CooldownClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "short" | "rabbit" => Ok(CooldownClass::Short),
            "medium" | "default" => Ok(CooldownClass::Medium),
            "long" | "turtle" => Ok(CooldownClass::Long),
            _ => Err(VibeError::Validation(format!(
                "invalid cooldown class '{}', expected short, medium or long",
                s
            ))
            .into()),
        }
    }
}

/// Stored cooldown state for one song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownRecord {
    /// Length class
    pub class: CooldownClass,
    /// Epoch milliseconds of the last play or class change, 0 if never
    #[serde(default)]
    pub last_played_at: i64,
    /// Window length, always derived from `class`
    pub duration_seconds: u64,
    /// Plays counted in the current window
    #[serde(default)]
    pub play_count: u32,
}

impl CooldownRecord {
    /// Fresh record that has never been played
    pub fn new(class: CooldownClass) -> Self {
        Self {
            class,
            last_played_at: 0,
            duration_seconds: class.duration_seconds(),
            play_count: 0,
        }
    }

    fn window_ms(&self) -> i64 {
        self.duration_seconds as i64 * 1000
    }

    /// Milliseconds until the song is eligible again
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        let elapsed = now_ms - self.last_played_at;
        (self.window_ms() - elapsed).max(0)
    }

    /// Whether the song is currently held back
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.remaining_ms(now_ms) > 0
    }
}

/// Display-ready view of a song's cooldown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownDescription {
    /// Length class (medium when no record exists)
    pub class: CooldownClass,
    /// Icon for the class
    pub icon: &'static str,
    /// Whether the song is held back right now
    pub active: bool,
    /// Milliseconds left, 0 when inactive
    pub remaining_ms: i64,
    /// Coarse human-readable remaining time
    pub remaining: String,
    /// Plays counted in the current window
    pub play_count: u32,
}

/// Render a remaining duration using its two coarsest units
///
/// # Examples
///
/// ```
/// use vinylvibe::state::format_remaining;
///
/// assert_eq!(format_remaining(0), "Available");
/// assert_eq!(format_remaining(42_000), "42s");
/// assert_eq!(format_remaining(7 * 60_000 + 5_000), "7m");
/// assert_eq!(format_remaining((5 * 60 + 12) * 60_000), "5h 12m");
/// assert_eq!(format_remaining((51 * 60) * 60_000), "2d 3h");
/// ```
pub fn format_remaining(ms: i64) -> String {
    if ms <= 0 {
        return "Available".to_string();
    }
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Cooldown operations over the preference store
pub struct CooldownStore {
    prefs: Arc<PreferenceStore>,
    clock: Arc<dyn Clock>,
}

impl CooldownStore {
    /// Create a store backed by `prefs`
    pub fn new(prefs: Arc<PreferenceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { prefs, clock }
    }

    /// Assign a class and restart the window now
    ///
    /// The play count of an existing record is preserved.
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Storage` if the change cannot be persisted
    pub fn set_cooldown(&self, song_id: &str, class: CooldownClass) -> Result<CooldownRecord> {
        let now = self.clock.now_millis();
        let record = self.prefs.update_cooldown(song_id, |existing| CooldownRecord {
            class,
            last_played_at: now,
            duration_seconds: class.duration_seconds(),
            play_count: existing.map(|r| r.play_count).unwrap_or(0),
        })?;
        tracing::info!(
            song_id,
            class = class.as_str(),
            "Set cooldown ({}s)",
            class.duration_seconds()
        );
        Ok(record)
    }

    /// [`set_cooldown`](Self::set_cooldown) with a class given by name
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` for an unknown class name, before any
    /// state changes
    pub fn set_cooldown_named(&self, song_id: &str, class: &str) -> Result<CooldownRecord> {
        let class: CooldownClass = class.parse()?;
        self.set_cooldown(song_id, class)
    }

    /// Move a song to the next class
    ///
    /// A song without a record counts as medium, so its first cycle yields
    /// long.
    pub fn cycle_cooldown(&self, song_id: &str) -> Result<CooldownClass> {
        let current = self
            .prefs
            .cooldown(song_id)
            .map(|record| record.class)
            .unwrap_or_default();
        let next = current.next();
        self.set_cooldown(song_id, next)?;
        Ok(next)
    }

    /// Whether a song may appear in a new playlist
    pub fn is_eligible(&self, song_id: &str) -> bool {
        match self.prefs.cooldown(song_id) {
            Some(record) => !record.is_active(self.clock.now_millis()),
            None => true,
        }
    }

    /// Current cooldown state for display
    pub fn describe(&self, song_id: &str) -> CooldownDescription {
        let now = self.clock.now_millis();
        match self.prefs.cooldown(song_id) {
            Some(record) => {
                let remaining_ms = record.remaining_ms(now);
                CooldownDescription {
                    class: record.class,
                    icon: record.class.icon(),
                    active: remaining_ms > 0,
                    remaining_ms,
                    remaining: format_remaining(remaining_ms),
                    play_count: record.play_count,
                }
            }
            None => CooldownDescription {
                class: CooldownClass::Medium,
                icon: CooldownClass::Medium.icon(),
                active: false,
                remaining_ms: 0,
                remaining: format_remaining(0),
                play_count: 0,
            },
        }
    }

    /// Count a play and restart the window
    ///
    /// Creates a medium record on first play. If the previous window had
    /// already run out before this play, the count restarts at one.
    pub fn record_play(&self, song_id: &str) -> Result<CooldownRecord> {
        let now = self.clock.now_millis();
        let record = self.prefs.update_cooldown(song_id, |existing| {
            let mut record = existing.unwrap_or_else(|| CooldownRecord::new(CooldownClass::Medium));
            let window_elapsed = record.last_played_at > 0 && !record.is_active(now);
            record.play_count = if window_elapsed {
                1
            } else {
                record.play_count.saturating_add(1)
            };
            record.last_played_at = now;
            record.duration_seconds = record.class.duration_seconds();
            record
        })?;
        tracing::debug!(song_id, plays = record.play_count, "Recorded play");
        Ok(record)
    }

    /// Average plays per day over a week, e.g. `"0.3x/day"`
    pub fn play_frequency(&self, song_id: &str) -> String {
        let plays = self
            .prefs
            .cooldown(song_id)
            .map(|record| record.play_count)
            .unwrap_or(0);
        if plays == 0 {
            return "0x/day".to_string();
        }
        let per_day = (plays as f64 / 7.0 * 10.0).round() / 10.0;
        format!("{}x/day", per_day)
    }
}
