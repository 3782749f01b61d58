//! Prompt templates for model calls
//!
//! Each gateway operation pairs a serializable context with a pure builder
//! function. The builders are deterministic, so identical contexts produce
//! identical prompts and therefore identical cache keys.

use crate::types::{FeedbackEvent, PlayedSong, Seed, SliderSet, Traits};
use serde::Serialize;

/// System message sent with every request
pub const SYSTEM_PROMPT: &str = "You are a music recommendation assistant. You provide detailed, accurate responses about music in JSON format.";

/// Context for turning a seed into traits
#[derive(Debug, Clone, Serialize)]
pub struct SeedContext<'a> {
    /// The submitted seed
    pub seed: &'a Seed,
}

/// Context for requesting recommendations
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext<'a> {
    /// Traits in effect
    pub traits: &'a Traits,
    /// Slider positions
    pub sliders: &'a SliderSet,
    /// Recently played songs, oldest first
    pub last10: &'a [PlayedSong],
}

/// Context for revising traits from feedback
#[derive(Debug, Clone, Serialize)]
pub struct TraitUpdateContext<'a> {
    /// Traits before revision
    pub traits: &'a Traits,
    /// Feedback batch being applied
    pub feedback: &'a [FeedbackEvent],
}

/// Build the seed interpretation prompt
///
/// # Examples
///
/// ```
/// use vinylvibe::prompts::{interpret_seed_prompt, SeedContext};
/// use vinylvibe::types::Seed;
///
/// let seed = Seed::text("Wagon Wheel").unwrap();
/// let prompt = interpret_seed_prompt(&SeedContext { seed: &seed });
/// assert!(prompt.contains("\"Wagon Wheel\""));
/// ```
pub fn interpret_seed_prompt(ctx: &SeedContext<'_>) -> String {
    format!(
        r#"You are a music expert. Given "{seed}", extract or infer these traits:
- Primary genre(s)
- Mood
- Tempo
- Lyrics theme
- Instruments

Return in JSON format only:
{{
  "genre": ["genre1", "genre2"],
  "mood": "descriptive mood",
  "tempo": number between 0-100 (0=very slow, 100=very fast),
  "lyricsTheme": "theme description",
  "instruments": ["instrument1", "instrument2"]
}}

Example: For "Wagon Wheel" ->
{{
  "genre": ["folk-country"],
  "mood": "nostalgic",
  "tempo": 65,
  "lyricsTheme": "travel and longing",
  "instruments": ["acoustic guitar", "fiddle", "banjo"]
}}

If you cannot interpret the seed, return {{"error": "reason"}}."#,
        seed = ctx.seed.value
    )
}

/// Describe a slider position for the model
fn slider_line(label: &str, value: u8, low: &str, high: &str) -> String {
    let meaning = if value < 50 { low } else { high };
    format!("- {}: {}/100 ({})", label, value, meaning)
}

/// Build the recommendation prompt
///
/// Folds the slider positions and listening history into one request so a
/// single model call yields the next playlist.
pub fn recommendations_prompt(ctx: &RecommendationContext<'_>) -> String {
    let traits = serde_json::to_string(ctx.traits).unwrap_or_default();
    let sliders = ctx.sliders;
    let preferences = [
        slider_line(
            "Genre Variety",
            sliders.genre_variety,
            "focused on exact genres",
            "explore diverse genres",
        ),
        slider_line(
            "Artist Fame",
            sliders.artist_fame,
            "prefer obscure artists",
            "prefer popular artists",
        ),
        slider_line(
            "Theme Focus",
            sliders.theme_focus,
            "loose theme adherence",
            "strict theme adherence",
        ),
        slider_line(
            "Seed Artist Mix",
            sliders.seed_artist_mix,
            "different artists than seed",
            "similar artists to seed",
        ),
    ]
    .join("\n");

    let history = if ctx.last10.is_empty() {
        "none yet".to_string()
    } else {
        let played: Vec<String> = ctx
            .last10
            .iter()
            .map(|song| format!("{} by {}", song.title, song.artist))
            .collect();
        serde_json::to_string(&played).unwrap_or_default()
    };

    format!(
        r#"You are a music curator. Suggest 5 unique song titles and artists based on these traits and user preferences:

Traits: {traits}

User Preferences (adjust recommendations accordingly):
{preferences}

Recently played: {history}
Avoid repeating songs or artists from the recently played list.
Prioritize songs that are adjacent to the traits but still match the overall theme.

Return in JSON format only, an array of objects:
[
  {{
    "title": "Song Title",
    "artist": "Artist Name",
    "reason": "Brief explanation of why this song matches the traits and preferences"
  }}
]

Example response:
[
  {{
    "title": "On the Road Again",
    "artist": "Willie Nelson",
    "reason": "Classic country travel song with similar nostalgic feel"
  }},
  {{
    "title": "Wagon Wheel",
    "artist": "Old Crow Medicine Show",
    "reason": "Folk-country song with themes of travel and longing"
  }}
]"#
    )
}

/// Build the feedback-driven trait revision prompt
pub fn update_traits_prompt(ctx: &TraitUpdateContext<'_>) -> String {
    let traits = serde_json::to_string(ctx.traits).unwrap_or_default();
    let feedback = serde_json::to_string(ctx.feedback).unwrap_or_default();
    format!(
        r#"You are a music analyst. Update these musical traits based on user feedback:

- Current traits: {traits}
- Feedback: {feedback}

Feedback is an array of objects with a trait and a value (+/-).
Adjust numeric traits by approximately +10 for positive feedback (+) and
-10 for negative feedback (-). Cap all numeric values between 0-100.
For non-numeric traits, adjust by adding or removing elements.

Return in JSON format only:
{{
  "genre": ["updated genres"],
  "mood": "updated mood",
  "tempo": updated number,
  "lyricsTheme": "updated theme",
  "instruments": ["updated instruments"]
}}

Example: For traits with tempo=50 and feedback [{{"trait": "speed", "value": "+"}}]:
{{
  "genre": ["folk-country"],
  "mood": "nostalgic",
  "tempo": 60,
  "lyricsTheme": "travel and longing",
  "instruments": ["acoustic guitar", "fiddle"]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeedbackTrait, FeedbackValue};

    fn traits() -> Traits {
        Traits {
            genre: vec!["folk".to_string()],
            mood: "wistful".to_string(),
            tempo: 60,
            lyrics_theme: "open roads".to_string(),
            instruments: vec!["banjo".to_string()],
        }
    }

    #[test]
    fn test_interpret_seed_prompt_mentions_seed_and_error_contract() {
        let seed = Seed::text("folk road trip").unwrap();
        let prompt = interpret_seed_prompt(&SeedContext { seed: &seed });
        assert!(prompt.contains("\"folk road trip\""));
        assert!(prompt.contains(r#"{"error": "reason"}"#));
        assert!(prompt.contains("lyricsTheme"));
    }

    #[test]
    fn test_recommendations_prompt_describes_sliders() {
        let traits = traits();
        let mut sliders = SliderSet::default();
        sliders.artist_fame = 10;
        let prompt = recommendations_prompt(&RecommendationContext {
            traits: &traits,
            sliders: &sliders,
            last10: &[],
        });
        assert!(prompt.contains("Artist Fame: 10/100 (prefer obscure artists)"));
        assert!(prompt.contains("Genre Variety: 50/100 (explore diverse genres)"));
        assert!(prompt.contains("Recently played: none yet"));
        assert!(prompt.contains(r#""lyricsTheme":"open roads""#));
    }

    #[test]
    fn test_recommendations_prompt_lists_history() {
        let traits = traits();
        let sliders = SliderSet::default();
        let history = vec![PlayedSong {
            title: "Jolene".to_string(),
            artist: "Dolly Parton".to_string(),
            played_at: 1,
        }];
        let prompt = recommendations_prompt(&RecommendationContext {
            traits: &traits,
            sliders: &sliders,
            last10: &history,
        });
        assert!(prompt.contains(r#"["Jolene by Dolly Parton"]"#));
    }

    #[test]
    fn test_update_traits_prompt_embeds_feedback() {
        let traits = traits();
        let feedback = vec![FeedbackEvent {
            song_id: "a_b".to_string(),
            trait_kind: FeedbackTrait::Speed,
            value: FeedbackValue::Positive,
            timestamp: 0,
        }];
        let prompt = update_traits_prompt(&TraitUpdateContext {
            traits: &traits,
            feedback: &feedback,
        });
        assert!(prompt.contains(r#""trait":"speed""#));
        assert!(prompt.starts_with("You are a music analyst"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let seed = Seed::text("jazz").unwrap();
        let ctx = SeedContext { seed: &seed };
        assert_eq!(interpret_seed_prompt(&ctx), interpret_seed_prompt(&ctx));
    }
}
