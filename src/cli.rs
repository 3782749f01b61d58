//! Command-line interface definition for VinylVibe
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for one-shot generation, the interactive session,
//! and offline cooldown and slider management.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// VinylVibe - LLM-driven music recommendations
///
/// Turn a song, artist or mood into a playlist, then steer it with sliders,
/// feedback and per-song cooldowns.
#[derive(Parser, Debug, Clone)]
#[command(name = "vinylvibe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the preference database location
    #[arg(long, value_name = "PATH")]
    pub storage_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for VinylVibe
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate one playlist from a seed and print it
    Generate {
        /// Song, artist or mood to start from
        #[arg(required = true, num_args = 1..)]
        seed: Vec<String>,

        /// Print the playlist as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive listening session
    Session {
        /// Override the provider from config (openai, ollama)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Inspect or change per-song cooldowns
    Cooldown {
        /// Cooldown subcommand
        #[command(subcommand)]
        command: CooldownCommand,
    },

    /// Inspect or change generation sliders
    Sliders {
        /// Slider subcommand
        #[command(subcommand)]
        command: SliderCommand,
    },
}

/// Cooldown management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CooldownCommand {
    /// List every song with a cooldown record
    Show,

    /// Advance a song to the next cooldown class
    Cycle {
        /// Song title
        title: String,
        /// Performing artist
        artist: String,
    },

    /// Assign a cooldown class to a song
    Set {
        /// Song title
        title: String,
        /// Performing artist
        artist: String,
        /// short, medium or long (rabbit, default, turtle also accepted)
        #[arg(default_value = "medium")]
        class: String,
    },
}

/// Slider management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SliderCommand {
    /// Print current slider values
    Show,

    /// Set one slider
    Set {
        /// genreVariety, artistFame, themeFocus or seedArtistMix
        name: String,
        /// 0-100
        value: i64,
    },

    /// Restore every slider to 50
    Reset,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate_joins_words() {
        let cli = Cli::try_parse_from(["vinylvibe", "generate", "folk", "road", "trip"]).unwrap();
        match cli.command {
            Commands::Generate { seed, json } => {
                assert_eq!(seed.join(" "), "folk road trip");
                assert!(!json);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parse_generate_json() {
        let cli = Cli::try_parse_from(["vinylvibe", "generate", "--json", "jazz"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { json: true, .. }));
    }

    #[test]
    fn test_cli_generate_requires_seed() {
        assert!(Cli::try_parse_from(["vinylvibe", "generate"]).is_err());
    }

    #[test]
    fn test_cli_parse_session_with_provider() {
        let cli = Cli::try_parse_from(["vinylvibe", "session", "--provider", "ollama"]).unwrap();
        match cli.command {
            Commands::Session { provider } => assert_eq!(provider, Some("ollama".to_string())),
            _ => panic!("Expected Session command"),
        }
    }

    #[test]
    fn test_cli_parse_cooldown_set_default_class() {
        let cli =
            Cli::try_parse_from(["vinylvibe", "cooldown", "set", "Jolene", "Dolly Parton"]).unwrap();
        match cli.command {
            Commands::Cooldown {
                command: CooldownCommand::Set { title, artist, class },
            } => {
                assert_eq!(title, "Jolene");
                assert_eq!(artist, "Dolly Parton");
                assert_eq!(class, "medium");
            }
            _ => panic!("Expected Cooldown Set command"),
        }
    }

    #[test]
    fn test_cli_parse_sliders_set() {
        let cli = Cli::try_parse_from(["vinylvibe", "sliders", "set", "artistFame", "20"]).unwrap();
        match cli.command {
            Commands::Sliders {
                command: SliderCommand::Set { name, value },
            } => {
                assert_eq!(name, "artistFame");
                assert_eq!(value, 20);
            }
            _ => panic!("Expected Sliders Set command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "vinylvibe",
            "--verbose",
            "--storage-path",
            "/tmp/vibes",
            "--config",
            "custom.yaml",
            "sliders",
            "show",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.storage_path, Some(PathBuf::from("/tmp/vibes")));
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
    }
}
