//! Terminal rendering for playlists, sliders and cooldowns

use crate::state::{format_remaining, CooldownRecord, SessionState};
use crate::types::{PlaylistEntry, SliderSet, Traits};

use colored::Colorize;
use prettytable::{row, Table};
use std::collections::BTreeMap;

/// Print the playlist as a table; position 1 is now playing
pub fn print_playlist(playlist: &[PlaylistEntry]) {
    if playlist.is_empty() {
        println!("No playlist yet. Use 'seed <text>' to generate one.");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["#", "Title", "Artist", "Why"]);
    for (index, entry) in playlist.iter().enumerate() {
        let position = if index == 0 {
            "▶".to_string()
        } else {
            (index + 1).to_string()
        };
        table.add_row(row![position, entry.title, entry.artist, entry.reason]);
    }

    println!();
    table.printstd();
    println!();
}

/// Print slider positions
pub fn print_sliders(sliders: &SliderSet) {
    let mut table = Table::new();
    table.add_row(row!["Slider", "Value"]);
    for (name, value) in sliders.entries() {
        table.add_row(row![name, value]);
    }
    println!();
    table.printstd();
    println!();
}

/// Print every cooldown record
pub fn print_cooldowns(cooldowns: &BTreeMap<String, CooldownRecord>, now_ms: i64) {
    if cooldowns.is_empty() {
        println!("No cooldowns recorded");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["Song", "Class", "Remaining", "Plays"]);
    for (song_id, record) in cooldowns {
        table.add_row(row![
            song_id,
            format!("{} {}", record.class.icon(), record.class),
            format_remaining(record.remaining_ms(now_ms)),
            record.play_count
        ]);
    }
    println!();
    table.printstd();
    println!();
}

/// One-line trait summary
pub fn traits_line(traits: &Traits) -> String {
    format!(
        "{} | {} | tempo {} | {} | {}",
        traits.genre.join(", "),
        traits.mood,
        traits.tempo,
        traits.lyrics_theme,
        traits.instruments.join(", ")
    )
}

/// Print seed, traits and pending work
pub fn print_state(state: &SessionState, sliders: &SliderSet) {
    println!();
    match &state.seed {
        Some(seed) => println!("Seed:       {}", seed.value.bold()),
        None => println!("Seed:       {}", "none".dimmed()),
    }
    match &state.traits {
        Some(traits) => println!("Traits:     {}", traits_line(traits)),
        None => println!("Traits:     {}", "none".dimmed()),
    }
    if let Some(entry) = state.now_playing() {
        println!("Now:        {} - {}", entry.title, entry.artist);
    }
    println!("Playlist:   {} songs", state.playlist.len());
    println!("History:    {} played", state.history.len());
    println!("Feedback:   {} logged", state.feedback_log.len());
    let slider_text = sliders
        .entries()
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(" ");
    println!("Sliders:    {}", slider_text);

    let mut pending = Vec::new();
    if state.generating {
        pending.push("generating");
    }
    if state.slider_pending {
        pending.push("slider update");
    }
    if state.feedback_pending {
        pending.push("feedback");
    }
    if !pending.is_empty() {
        println!("Pending:    {}", pending.join(", ").yellow());
    }
    println!();
}

/// Print the error log, oldest first
pub fn print_errors(state: &SessionState) {
    if state.errors.is_empty() {
        println!("No errors");
        return;
    }
    for record in state.errors.iter() {
        let when = chrono::DateTime::from_timestamp_millis(record.timestamp)
            .map(|time| time.format("%H:%M:%S").to_string())
            .unwrap_or_default();
        println!("{} {}", when.dimmed(), record.message.red());
    }
}
