//! Interactive listening session
//!
//! Builds the engine with a console observer, then runs a readline loop
//! that maps each command onto an [`EngineFacade`] operation. Regenerations
//! triggered by debounced slider and feedback changes run in the background
//! and print their playlist through the observer when they land.

use crate::commands::display;
use crate::commands::session_commands::{parse_session_command, print_help, SessionCommand};
use crate::config::Config;
use crate::engine::{
    EngineBuilder, EngineFacade, EngineObserver, FlushOutcome, GenerationOutcome, PendingKind,
};
use crate::error::{Result, VibeError};
use crate::types::PlaylistEntry;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

/// Observer that renders engine notifications to the terminal
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl EngineObserver for ConsoleObserver {
    fn on_playlist_updated(&self, playlist: &[PlaylistEntry]) {
        display::print_playlist(playlist);
    }

    fn on_error(&self, message: &str) {
        eprintln!("{}", format!("Error: {}", message).red());
    }

    fn on_pending_changed(&self, kind: PendingKind, pending: bool) {
        if !pending {
            return;
        }
        let text = match kind {
            PendingKind::Sliders => "Sliders changed, regenerating shortly...",
            PendingKind::Feedback => "Feedback noted, applying shortly...",
        };
        println!("{}", text.dimmed());
    }

    fn on_loading(&self, message: Option<&str>) {
        if let Some(message) = message {
            println!("{}", message.dimmed());
        }
    }
}

/// Start the interactive session
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
///
/// # Errors
///
/// Returns an error if the engine or the line editor cannot be created
pub async fn run_session(config: Config) -> Result<()> {
    let engine = EngineBuilder::new(config)
        .observer(Arc::new(ConsoleObserver))
        .build()?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| VibeError::Config(format!("Failed to start line editor: {}", e)))?;

    println!(
        "\n{} using {}. Type {} for commands.\n",
        "VinylVibe".bold(),
        engine.provider_name().cyan(),
        "help".cyan()
    );

    loop {
        match rl.readline("vibe> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                match parse_session_command(&line) {
                    Ok(SessionCommand::Exit) => break,
                    Ok(command) => {
                        if let Err(e) = execute(&engine, command).await {
                            eprintln!("{}", format!("Error: {}", e).red());
                        }
                    }
                    Err(e) => eprintln!("{}", e.to_string().yellow()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    engine.cancel_pending();
    println!("Goodbye!");
    Ok(())
}

/// Song id of the entry at 1-based `position`
fn song_id_at(engine: &EngineFacade, position: usize) -> Result<(String, PlaylistEntry)> {
    let state = engine.get_state();
    let entry = state
        .playlist
        .get(position - 1)
        .cloned()
        .ok_or_else(|| {
            VibeError::Validation(format!(
                "no song at position {} (playlist has {})",
                position,
                state.playlist.len()
            ))
        })?;
    Ok((entry.song_id(), entry))
}

/// Run one parsed command against the engine
pub async fn execute(engine: &EngineFacade, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Seed(seed) => {
            if let GenerationOutcome::Queued = engine.generate_from_seed(&seed).await? {
                println!("{}", "Queued behind the running generation".dimmed());
            }
        }
        SessionCommand::Slider { name, value } => {
            let sliders = engine.handle_slider_change(&name, value)?;
            display::print_sliders(&sliders);
        }
        SessionCommand::ShowSliders => {
            display::print_sliders(&engine.get_preferences().sliders);
        }
        SessionCommand::ResetSliders => {
            let sliders = engine.reset_sliders()?;
            display::print_sliders(&sliders);
        }
        SessionCommand::Feedback {
            position,
            trait_kind,
            value,
        } => {
            let (song_id, entry) = song_id_at(engine, position)?;
            let event = engine.handle_feedback(&song_id, &trait_kind, &value)?;
            println!(
                "{} {} on {} - {}",
                event.value.to_string().bold(),
                event.trait_kind,
                entry.title,
                entry.artist
            );
        }
        SessionCommand::Flush => match engine.flush_feedback().await {
            FlushOutcome::Empty => println!("No pending feedback"),
            FlushOutcome::NoTraits => println!("Generate a playlist before sending feedback"),
            FlushOutcome::InFlight => println!("Feedback is already being applied"),
            FlushOutcome::Applied(_) | FlushOutcome::Failed(_) => {}
        },
        SessionCommand::Play(position) => {
            if engine.has_player() {
                let started = engine.play_on_device(position - 1).await?;
                if !started {
                    println!("{}", "The player did not start the track".yellow());
                }
            } else {
                let entry = engine.play_song(position - 1)?;
                println!("Now playing {} - {}", entry.title.bold(), entry.artist);
            }
        }
        SessionCommand::Cooldown { position, class } => {
            let (song_id, entry) = song_id_at(engine, position)?;
            match class {
                Some(class) => {
                    engine.set_cooldown(&song_id, &class)?;
                }
                None => {
                    engine.cycle_cooldown(&song_id)?;
                }
            }
            let description = engine.describe_cooldown(&song_id);
            println!(
                "{} {} - {}: {} ({}, {})",
                description.icon,
                entry.title,
                entry.artist,
                description.class,
                description.remaining,
                engine.play_frequency(&song_id)
            );
        }
        SessionCommand::ShowPlaylist => display::print_playlist(&engine.get_state().playlist),
        SessionCommand::ShowState => {
            display::print_state(&engine.get_state(), &engine.get_preferences().sliders)
        }
        SessionCommand::ShowErrors => display::print_errors(&engine.get_state()),
        SessionCommand::ClearErrors => engine.clear_errors(),
        SessionCommand::Cancel => {
            engine.cancel_pending();
            println!("Cancelled pending work");
        }
        SessionCommand::Help => print_help(),
        SessionCommand::Exit | SessionCommand::Empty => {}
    }
    Ok(())
}
