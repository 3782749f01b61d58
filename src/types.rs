//! Core domain types
//!
//! Seeds, traits, recommendations, playlist entries, feedback events and the
//! slider set. All JSON forms use camelCase keys since they are embedded in
//! model prompts and persisted preferences.

use crate::error::{Result, VibeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Default reason attached to recommendations that arrive without one
pub const DEFAULT_REASON: &str = "Matches your music preferences";

/// Default value for every slider
pub const DEFAULT_SLIDER_VALUE: u8 = 50;

/// Neutral tempo used when the model omits one
pub const DEFAULT_TEMPO: u8 = 50;

/// Kind of seed the user submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    /// Free text: a song, an artist or a mood
    #[default]
    Text,
}

impl fmt::Display for SeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedKind::Text => write!(f, "text"),
        }
    }
}

/// User-provided starting point for a playlist
///
/// # Examples
///
/// ```
/// use vinylvibe::types::Seed;
///
/// let seed = Seed::text("  folk road trip ").unwrap();
/// assert_eq!(seed.value, "folk road trip");
/// assert!(Seed::text("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    /// Seed kind
    #[serde(rename = "type")]
    pub kind: SeedKind,
    /// Seed text, trimmed
    pub value: String,
}

impl Seed {
    /// Build a text seed, rejecting empty or whitespace-only input
    pub fn text(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(VibeError::Validation("seed cannot be empty".to_string()).into());
        }
        Ok(Self {
            kind: SeedKind::Text,
            value: trimmed.to_string(),
        })
    }
}

/// Musical characteristics inferred from a seed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traits {
    /// Primary genres
    pub genre: Vec<String>,
    /// Descriptive mood
    pub mood: String,
    /// 0 = very slow, 100 = very fast
    pub tempo: u8,
    /// What the lyrics are about
    pub lyrics_theme: String,
    /// Prominent instruments
    pub instruments: Vec<String>,
}

impl Traits {
    /// Decode traits from loosely shaped model output
    ///
    /// `genre` and `instruments` may be a string or an array of strings.
    /// `tempo` may be a number or a numeric string and is clamped to 0..=100.
    /// An object carrying an `error` key is treated as a refusal.
    ///
    /// # Returns
    ///
    /// The decoded traits, or a message describing why decoding failed
    pub fn from_model_value(value: &Value) -> std::result::Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "expected a JSON object of traits".to_string())?;

        if let Some(error) = object.get("error") {
            return Err(match error {
                Value::String(message) => message.clone(),
                other => other.to_string(),
            });
        }

        let genre = string_list(object.get("genre"));
        let mood = string_field(object.get("mood"));
        let lyrics_theme = string_field(
            object
                .get("lyricsTheme")
                .or_else(|| object.get("lyrics_theme")),
        );
        let instruments = string_list(object.get("instruments"));
        let tempo = tempo_field(object.get("tempo"));

        if genre.is_empty() && mood.is_empty() && lyrics_theme.is_empty() && instruments.is_empty()
        {
            return Err("model reply contained no recognizable traits".to_string());
        }

        Ok(Self {
            genre,
            mood,
            tempo,
            lyrics_theme,
            instruments,
        })
    }

    /// Whether any genre mentions `keyword`, case-insensitively
    pub fn mentions_genre(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.genre
            .iter()
            .any(|genre| genre.to_lowercase().contains(&keyword))
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn string_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn tempo_field(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(t) if t.is_finite() => t.round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_TEMPO,
    }
}

/// One song suggested by the model, after normalization
///
/// Every field is optional because model output is heterogeneous. A
/// recommendation without a title cannot be played or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Recommendation {
    /// Song title (`song` is accepted as an alias)
    pub title: Option<String>,
    /// Performing artist
    pub artist: Option<String>,
    /// Why the song was picked
    pub reason: Option<String>,
}

impl Recommendation {
    /// Build a fully populated recommendation
    pub fn new(title: &str, artist: &str, reason: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            artist: Some(artist.to_string()),
            reason: Some(reason.to_string()),
        }
    }

    /// Normalize a single model-produced object
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_model_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            title: text("title").or_else(|| text("song")),
            artist: text("artist"),
            reason: text("reason").or_else(|| Some(DEFAULT_REASON.to_string())),
        })
    }

    /// Find and normalize a recommendation list in model output
    ///
    /// Accepts a bare array, an object with a `recommendations` array, or an
    /// object whose first array-valued property looks like a song list.
    ///
    /// # Returns
    ///
    /// `None` when no list-shaped value could be located
    pub fn list_from_model_value(value: &Value) -> Option<Vec<Self>> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(object) => match object.get("recommendations") {
                Some(Value::Array(items)) => items,
                _ => object.values().find_map(|candidate| match candidate {
                    Value::Array(items) if looks_like_song(items.first()) => Some(items),
                    _ => None,
                })?,
            },
            _ => return None,
        };

        Some(items.iter().filter_map(Self::from_model_value).collect())
    }

    /// Whether the recommendation carries a title
    pub fn is_identifiable(&self) -> bool {
        self.title.is_some()
    }
}

fn looks_like_song(first: Option<&Value>) -> bool {
    let Some(Value::Object(object)) = first else {
        return false;
    };
    let has = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    (has("title") || has("song")) && has("artist")
}

/// Normalize one component of a song identifier
fn normalize_key_part(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Compute the stable cooldown key for a song
///
/// # Examples
///
/// ```
/// use vinylvibe::types::song_id;
///
/// assert_eq!(song_id("Wagon  Wheel", " Old Crow Medicine Show"), "wagon_wheel_old_crow_medicine_show");
/// ```
pub fn song_id(title: &str, artist: &str) -> String {
    format!("{}_{}", normalize_key_part(title), normalize_key_part(artist))
}

/// Rating category a feedback event applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackTrait {
    /// Overall like or dislike
    General,
    /// Lyrics
    Lyrics,
    /// Genre
    Genre,
    /// Tempo
    Speed,
    /// Subject matter
    Topic,
    /// Era
    Time,
}

impl FeedbackTrait {
    /// Every trait in display order
    pub const ALL: [FeedbackTrait; 6] = [
        FeedbackTrait::General,
        FeedbackTrait::Lyrics,
        FeedbackTrait::Genre,
        FeedbackTrait::Speed,
        FeedbackTrait::Topic,
        FeedbackTrait::Time,
    ];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackTrait::General => "general",
            FeedbackTrait::Lyrics => "lyrics",
            FeedbackTrait::Genre => "genre",
            FeedbackTrait::Speed => "speed",
            FeedbackTrait::Topic => "topic",
            FeedbackTrait::Time => "time",
        }
    }
}

impl fmt::Display for FeedbackTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackTrait {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        FeedbackTrait::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| {
                VibeError::Validation(format!(
                    "unknown feedback trait '{}', expected one of general, lyrics, genre, speed, topic, time",
                    s
                ))
                .into()
            })
    }
}

/// Direction of a feedback event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackValue {
    /// More like this
    #[serde(rename = "+")]
    Positive,
    /// Less like this
    #[serde(rename = "-")]
    Negative,
}

impl fmt::Display for FeedbackValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackValue::Positive => write!(f, "+"),
            FeedbackValue::Negative => write!(f, "-"),
        }
    }
}

impl FromStr for FeedbackValue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "+" | "up" | "like" => Ok(FeedbackValue::Positive),
            "-" | "down" | "dislike" => Ok(FeedbackValue::Negative),
            other => Err(VibeError::Validation(format!(
                "unknown feedback value '{}', expected + or -",
                other
            ))
            .into()),
        }
    }
}

/// A single user reaction to a song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    /// Cooldown key of the rated song
    pub song_id: String,
    /// What was rated
    #[serde(rename = "trait")]
    pub trait_kind: FeedbackTrait,
    /// Up or down
    pub value: FeedbackValue,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// One row of the generated playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    /// Unique per generation, `song-<ULID>`
    pub id: String,
    /// Song title
    pub title: String,
    /// Performing artist
    pub artist: String,
    /// Why the song was picked
    pub reason: String,
    /// Traits in effect when the entry was generated
    pub traits_snapshot: Option<Traits>,
    /// Seed text the entry was generated from
    pub seed_value: String,
    /// Feedback recorded against this entry
    pub feedback: Vec<FeedbackEvent>,
}

impl PlaylistEntry {
    /// Cooldown key for this entry
    pub fn song_id(&self) -> String {
        song_id(&self.title, &self.artist)
    }
}

/// A song the user actually played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedSong {
    /// Song title
    pub title: String,
    /// Performing artist
    pub artist: String,
    /// Epoch milliseconds
    pub played_at: i64,
}

/// A reported failure kept in the session error log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Human readable message
    pub message: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Generation tuning sliders, each 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderSet {
    /// 0 = exact genres, 100 = diverse genres
    #[serde(default = "default_slider")]
    pub genre_variety: u8,
    /// 0 = obscure artists, 100 = popular artists
    #[serde(default = "default_slider")]
    pub artist_fame: u8,
    /// 0 = loose theme adherence, 100 = strict
    #[serde(default = "default_slider")]
    pub theme_focus: u8,
    /// 0 = different artists than the seed, 100 = similar artists
    #[serde(default = "default_slider")]
    pub seed_artist_mix: u8,
}

fn default_slider() -> u8 {
    DEFAULT_SLIDER_VALUE
}

impl Default for SliderSet {
    fn default() -> Self {
        Self {
            genre_variety: DEFAULT_SLIDER_VALUE,
            artist_fame: DEFAULT_SLIDER_VALUE,
            theme_focus: DEFAULT_SLIDER_VALUE,
            seed_artist_mix: DEFAULT_SLIDER_VALUE,
        }
    }
}

impl SliderSet {
    /// Canonical slider names
    pub const NAMES: [&'static str; 4] =
        ["genreVariety", "artistFame", "themeFocus", "seedArtistMix"];

    /// Set a slider by name
    ///
    /// Names are matched case-insensitively and ignore `_` and `-`, so
    /// `genre_variety` and `genreVariety` are the same slider.
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` for an unknown name or a value outside
    /// 0..=100. The set is unchanged on error.
    pub fn set(&mut self, name: &str, value: i64) -> Result<()> {
        if !(0..=100).contains(&value) {
            return Err(VibeError::Validation(format!(
                "slider value {} out of range 0-100",
                value
            ))
            .into());
        }
        let slot = self.slot_mut(name)?;
        *slot = value as u8;
        Ok(())
    }

    /// Read a slider by name
    pub fn get(&self, name: &str) -> Result<u8> {
        let mut copy = *self;
        Ok(*copy.slot_mut(name)?)
    }

    /// `(name, value)` pairs in canonical order
    pub fn entries(&self) -> [(&'static str, u8); 4] {
        [
            ("genreVariety", self.genre_variety),
            ("artistFame", self.artist_fame),
            ("themeFocus", self.theme_focus),
            ("seedArtistMix", self.seed_artist_mix),
        ]
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut u8> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "genrevariety" => Ok(&mut self.genre_variety),
            "artistfame" => Ok(&mut self.artist_fame),
            "themefocus" => Ok(&mut self.theme_focus),
            "seedartistmix" => Ok(&mut self.seed_artist_mix),
            _ => Err(VibeError::Validation(format!(
                "unknown slider '{}', expected one of {}",
                name,
                Self::NAMES.join(", ")
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_rejects_blank_input() {
        let err = Seed::text(" \t\n").unwrap_err();
        let classified = err.downcast_ref::<VibeError>().unwrap();
        assert!(matches!(classified, VibeError::Validation(_)));
    }

    #[test]
    fn test_seed_serializes_with_type_key() {
        let seed = Seed::text("Wagon Wheel").unwrap();
        let value = serde_json::to_value(&seed).unwrap();
        assert_eq!(value, json!({"type": "text", "value": "Wagon Wheel"}));
    }

    #[test]
    fn test_traits_accepts_strings_for_lists_and_tempo() {
        let traits = Traits::from_model_value(&json!({
            "genre": "folk",
            "mood": "wistful",
            "tempo": "72",
            "lyricsTheme": "open roads",
            "instruments": ["banjo", " fiddle "]
        }))
        .unwrap();
        assert_eq!(traits.genre, vec!["folk"]);
        assert_eq!(traits.tempo, 72);
        assert_eq!(traits.instruments, vec!["banjo", "fiddle"]);
    }

    #[test]
    fn test_traits_tempo_is_clamped_and_defaulted() {
        let fast = Traits::from_model_value(&json!({"genre": ["punk"], "tempo": 180})).unwrap();
        assert_eq!(fast.tempo, 100);
        let slow = Traits::from_model_value(&json!({"genre": ["drone"], "tempo": -4.2})).unwrap();
        assert_eq!(slow.tempo, 0);
        let missing = Traits::from_model_value(&json!({"mood": "calm"})).unwrap();
        assert_eq!(missing.tempo, DEFAULT_TEMPO);
    }

    #[test]
    fn test_traits_error_key_is_refusal() {
        let err = Traits::from_model_value(&json!({"error": "not a song"})).unwrap_err();
        assert_eq!(err, "not a song");
    }

    #[test]
    fn test_traits_rejects_non_object_and_empty_object() {
        assert!(Traits::from_model_value(&json!([1, 2])).is_err());
        assert!(Traits::from_model_value(&json!({"tempo": 10})).is_err());
    }

    #[test]
    fn test_traits_serialize_camel_case() {
        let traits = Traits {
            genre: vec!["jazz".into()],
            mood: "smoky".into(),
            tempo: 40,
            lyrics_theme: "late nights".into(),
            instruments: vec![],
        };
        let value = serde_json::to_value(&traits).unwrap();
        assert_eq!(value["lyricsTheme"], "late nights");
        assert!(traits.mentions_genre("JAZZ"));
    }

    #[test]
    fn test_recommendation_song_alias_and_default_reason() {
        let rec = Recommendation::from_model_value(&json!({"song": "Jolene", "artist": "Dolly Parton"}))
            .unwrap();
        assert_eq!(rec.title.as_deref(), Some("Jolene"));
        assert_eq!(rec.reason.as_deref(), Some(DEFAULT_REASON));
        assert!(rec.is_identifiable());
    }

    #[test]
    fn test_recommendation_list_from_wrapper_property() {
        let list = Recommendation::list_from_model_value(&json!({
            "recommendations": [{"title": "A", "artist": "B"}]
        }))
        .unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_recommendation_list_from_any_song_shaped_property() {
        let list = Recommendation::list_from_model_value(&json!({
            "note": "here you go",
            "songs": [{"song": "A", "artist": "B"}, {"title": "C", "artist": "D"}]
        }))
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].title.as_deref(), Some("C"));
    }

    #[test]
    fn test_recommendation_list_absent() {
        assert!(Recommendation::list_from_model_value(&json!({"genre": ["rock"]})).is_none());
        assert!(Recommendation::list_from_model_value(&json!("text")).is_none());
    }

    #[test]
    fn test_song_id_normalization() {
        assert_eq!(song_id("Hey  Jude", "The Beatles"), "hey_jude_the_beatles");
        assert_eq!(song_id(" HEY JUDE ", "the beatles"), song_id("Hey Jude", "The Beatles"));
    }

    #[test]
    fn test_feedback_parsing() {
        assert_eq!("Speed".parse::<FeedbackTrait>().unwrap(), FeedbackTrait::Speed);
        assert!("volume".parse::<FeedbackTrait>().is_err());
        assert_eq!("+".parse::<FeedbackValue>().unwrap(), FeedbackValue::Positive);
        assert_eq!("dislike".parse::<FeedbackValue>().unwrap(), FeedbackValue::Negative);
        assert!("meh".parse::<FeedbackValue>().is_err());
    }

    #[test]
    fn test_feedback_event_json_shape() {
        let event = FeedbackEvent {
            song_id: "a_b".into(),
            trait_kind: FeedbackTrait::Lyrics,
            value: FeedbackValue::Negative,
            timestamp: 5,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"songId": "a_b", "trait": "lyrics", "value": "-", "timestamp": 5}));
    }

    #[test]
    fn test_slider_set_validation() {
        let mut sliders = SliderSet::default();
        sliders.set("genre_variety", 80).unwrap();
        sliders.set("artistFame", 0).unwrap();
        assert_eq!(sliders.get("GenreVariety").unwrap(), 80);
        assert!(sliders.set("volume", 10).is_err());
        assert!(sliders.set("themeFocus", 101).is_err());
        assert!(sliders.set("themeFocus", -1).is_err());
        assert_eq!(sliders.theme_focus, DEFAULT_SLIDER_VALUE);
    }

    #[test]
    fn test_slider_set_partial_json_defaults() {
        let sliders: SliderSet = serde_json::from_value(json!({"artistFame": 10})).unwrap();
        assert_eq!(sliders.artist_fame, 10);
        assert_eq!(sliders.genre_variety, DEFAULT_SLIDER_VALUE);
    }
}
