//! Offline recommendation sets
//!
//! Used when the model answers but its answer holds no usable songs, so a
//! cycle still produces a playlist.

use crate::types::{Recommendation, Traits};

/// Genre keywords with a built-in set, in matching priority order
pub const FALLBACK_GENRES: [&str; 5] = ["rock", "pop", "jazz", "country", "electronic"];

const ROCK: [(&str, &str, &str); 5] = [
    ("Bohemian Rhapsody", "Queen", "Classic rock anthem with wide appeal"),
    ("Sweet Child O' Mine", "Guns N' Roses", "Iconic rock song with memorable guitar riff"),
    ("Stairway to Heaven", "Led Zeppelin", "Progressive rock masterpiece with folk influences"),
    ("Back in Black", "AC/DC", "Hard rock classic with driving rhythm"),
    ("Smells Like Teen Spirit", "Nirvana", "Grunge anthem that defined a generation"),
];

const POP: [(&str, &str, &str); 5] = [
    ("Billie Jean", "Michael Jackson", "Iconic pop song with unforgettable bassline"),
    ("Shape of You", "Ed Sheeran", "Modern pop hit with catchy hooks"),
    ("Bad Guy", "Billie Eilish", "Contemporary pop with unique production"),
    ("Uptown Funk", "Mark Ronson ft. Bruno Mars", "Funk-inspired pop hit with retro feel"),
    ("Shake It Off", "Taylor Swift", "Upbeat pop anthem with catchy chorus"),
];

const JAZZ: [(&str, &str, &str); 5] = [
    ("Take Five", "Dave Brubeck", "Jazz classic with distinctive 5/4 time signature"),
    ("So What", "Miles Davis", "Modal jazz masterpiece with cool, relaxed feel"),
    ("Take the 'A' Train", "Duke Ellington", "Swing era standard with memorable melody"),
    ("Autumn Leaves", "Cannonball Adderley", "Beautiful jazz standard with rich harmonies"),
    ("My Favorite Things", "John Coltrane", "Innovative jazz interpretation of a Broadway classic"),
];

const COUNTRY: [(&str, &str, &str); 5] = [
    ("Friends in Low Places", "Garth Brooks", "Country anthem with singalong chorus"),
    ("Jolene", "Dolly Parton", "Classic country with emotional storytelling"),
    ("Ring of Fire", "Johnny Cash", "Iconic country song with distinctive sound"),
    ("Cruise", "Florida Georgia Line", "Modern country with pop crossover appeal"),
    ("Before He Cheats", "Carrie Underwood", "Country hit with powerful vocals and narrative"),
];

const ELECTRONIC: [(&str, &str, &str); 5] = [
    ("Strobe", "deadmau5", "Progressive house classic with emotional build"),
    ("Levels", "Avicii", "EDM anthem with memorable melody"),
    ("Scary Monsters and Nice Sprites", "Skrillex", "Dubstep track that defined the genre"),
    ("Around the World", "Daft Punk", "Electronic dance classic with repetitive hook"),
    ("Sandstorm", "Darude", "Iconic trance track with recognizable melody"),
];

fn set_for(genre: &str) -> &'static [(&'static str, &'static str, &'static str); 5] {
    match genre {
        "rock" => &ROCK,
        "jazz" => &JAZZ,
        "country" => &COUNTRY,
        "electronic" => &ELECTRONIC,
        _ => &POP,
    }
}

/// Pick the fallback genre for a cycle
///
/// Trait genres are checked first, then the seed text. Defaults to pop.
pub fn pick_genre(seed_value: &str, traits: Option<&Traits>) -> &'static str {
    let from_traits = traits.and_then(|traits| {
        traits.genre.iter().find_map(|genre| {
            let genre = genre.to_lowercase();
            FALLBACK_GENRES
                .into_iter()
                .find(|keyword| genre.contains(keyword))
        })
    });

    from_traits
        .or_else(|| {
            let seed = seed_value.to_lowercase();
            FALLBACK_GENRES
                .into_iter()
                .find(|keyword| seed.contains(keyword))
        })
        .unwrap_or("pop")
}

/// Deterministic five-song list for the best matching genre
///
/// # Examples
///
/// ```
/// use vinylvibe::engine::fallback::fallback_recommendations;
///
/// let songs = fallback_recommendations("late night jazz club", None);
/// assert_eq!(songs.len(), 5);
/// assert_eq!(songs[0].title.as_deref(), Some("Take Five"));
/// ```
pub fn fallback_recommendations(seed_value: &str, traits: Option<&Traits>) -> Vec<Recommendation> {
    let genre = pick_genre(seed_value, traits);
    tracing::warn!(genre, "Using offline fallback recommendations");
    set_for(genre)
        .iter()
        .map(|(title, artist, reason)| Recommendation::new(title, artist, reason))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits_with(genres: &[&str]) -> Traits {
        Traits {
            genre: genres.iter().map(|g| g.to_string()).collect(),
            mood: "any".to_string(),
            tempo: 50,
            lyrics_theme: String::new(),
            instruments: Vec::new(),
        }
    }

    #[test]
    fn test_trait_genre_wins_over_seed() {
        let traits = traits_with(&["Alt-Country"]);
        assert_eq!(pick_genre("rock anthems", Some(&traits)), "country");
    }

    #[test]
    fn test_seed_used_when_traits_do_not_match() {
        let traits = traits_with(&["folk"]);
        assert_eq!(pick_genre("electronic road trip", Some(&traits)), "electronic");
        assert_eq!(pick_genre("Jazz", None), "jazz");
    }

    #[test]
    fn test_defaults_to_pop() {
        assert_eq!(pick_genre("folk road trip", None), "pop");
        let songs = fallback_recommendations("folk road trip", None);
        assert_eq!(songs[0].title.as_deref(), Some("Billie Jean"));
    }

    #[test]
    fn test_every_set_is_complete() {
        for genre in FALLBACK_GENRES {
            let songs = fallback_recommendations(genre, None);
            assert_eq!(songs.len(), 5);
            assert!(songs.iter().all(|song| song.is_identifiable() && song.artist.is_some()));
        }
    }
}
