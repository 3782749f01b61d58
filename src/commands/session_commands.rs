//! Command parser for the interactive session
//!
//! Each line typed in the session is one command word followed by its
//! arguments. Command words are case-insensitive. Playlist positions are
//! 1-based as shown in the playlist table.

use thiserror::Error;

/// Errors that can occur when parsing session commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType 'help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Argument could not be understood
    #[error("Invalid argument for {command}: {arg}\n\nUsage: {usage}")]
    InvalidArgument {
        command: String,
        arg: String,
        usage: String,
    },
}

/// Commands accepted by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Generate from a new seed
    Seed(String),

    /// Move one slider
    Slider { name: String, value: i64 },

    /// Show slider positions
    ShowSliders,

    /// Restore default sliders
    ResetSliders,

    /// Rate a playlist entry
    Feedback {
        position: usize,
        trait_kind: String,
        value: String,
    },

    /// Send pending feedback now
    Flush,

    /// Play a playlist entry
    Play(usize),

    /// Cycle or set the cooldown of a playlist entry
    Cooldown {
        position: usize,
        class: Option<String>,
    },

    /// Show the playlist
    ShowPlaylist,

    /// Show seed, traits and pending work
    ShowState,

    /// Show the error log
    ShowErrors,

    /// Empty the error log
    ClearErrors,

    /// Cancel pending slider and feedback work
    Cancel,

    /// Display help information
    Help,

    /// Leave the session
    Exit,

    /// Blank line
    Empty,
}

/// Parse one line of session input
///
/// # Errors
///
/// Returns `CommandError` for unknown commands and malformed arguments
///
/// # Examples
///
/// ```
/// use vinylvibe::commands::session_commands::{parse_session_command, SessionCommand};
///
/// assert_eq!(
///     parse_session_command("seed folk road trip").unwrap(),
///     SessionCommand::Seed("folk road trip".to_string())
/// );
/// assert_eq!(parse_session_command("play 2").unwrap(), SessionCommand::Play(2));
/// assert!(parse_session_command("play zero").is_err());
/// ```
pub fn parse_session_command(input: &str) -> Result<SessionCommand, CommandError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(SessionCommand::Empty);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match word.to_lowercase().as_str() {
        "seed" | "s" => {
            if rest.is_empty() {
                return Err(missing("seed", "seed <song, artist or mood>"));
            }
            Ok(SessionCommand::Seed(rest.to_string()))
        }
        "slider" => match args.as_slice() {
            [name, value] => {
                let value = value.parse::<i64>().map_err(|_| {
                    invalid("slider", value, "slider <name> <0-100>")
                })?;
                Ok(SessionCommand::Slider {
                    name: name.to_string(),
                    value,
                })
            }
            _ => Err(missing("slider", "slider <name> <0-100>")),
        },
        "sliders" => Ok(SessionCommand::ShowSliders),
        "reset" => Ok(SessionCommand::ResetSliders),
        "feedback" | "fb" => match args.as_slice() {
            [position, trait_kind, value] => Ok(SessionCommand::Feedback {
                position: parse_position("feedback", position, FEEDBACK_USAGE)?,
                trait_kind: trait_kind.to_string(),
                value: value.to_string(),
            }),
            [position, value] => Ok(SessionCommand::Feedback {
                position: parse_position("feedback", position, FEEDBACK_USAGE)?,
                trait_kind: "general".to_string(),
                value: value.to_string(),
            }),
            _ => Err(missing("feedback", FEEDBACK_USAGE)),
        },
        "flush" => Ok(SessionCommand::Flush),
        "play" | "p" => match args.as_slice() {
            [position] => Ok(SessionCommand::Play(parse_position(
                "play",
                position,
                "play <position>",
            )?)),
            _ => Err(missing("play", "play <position>")),
        },
        "cooldown" | "cd" => match args.as_slice() {
            [position] => Ok(SessionCommand::Cooldown {
                position: parse_position("cooldown", position, COOLDOWN_USAGE)?,
                class: None,
            }),
            [position, class] => Ok(SessionCommand::Cooldown {
                position: parse_position("cooldown", position, COOLDOWN_USAGE)?,
                class: Some(class.to_string()),
            }),
            _ => Err(missing("cooldown", COOLDOWN_USAGE)),
        },
        "playlist" | "ls" => Ok(SessionCommand::ShowPlaylist),
        "state" | "status" => Ok(SessionCommand::ShowState),
        "errors" => Ok(SessionCommand::ShowErrors),
        "clear" => Ok(SessionCommand::ClearErrors),
        "cancel" => Ok(SessionCommand::Cancel),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" | "q" => Ok(SessionCommand::Exit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

const FEEDBACK_USAGE: &str = "feedback <position> [trait] <+|->";
const COOLDOWN_USAGE: &str = "cooldown <position> [short|medium|long]";

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn invalid(command: &str, arg: &str, usage: &str) -> CommandError {
    CommandError::InvalidArgument {
        command: command.to_string(),
        arg: arg.to_string(),
        usage: usage.to_string(),
    }
}

fn parse_position(command: &str, arg: &str, usage: &str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(invalid(command, arg, usage)),
    }
}

/// Print help for the session commands
pub fn print_help() {
    println!(
        r#"
Session Commands
================

PLAYLIST:
  seed <text>                 - Generate a playlist from a song, artist or mood
  playlist                    - Show the current playlist
  play <position>             - Play a song (moves it to the top)

TUNING:
  sliders                     - Show slider positions
  slider <name> <0-100>       - Move a slider (regenerates after a short pause)
  reset                       - Restore every slider to 50

FEEDBACK:
  feedback <position> [trait] <+|->
                              - Rate a song; trait is general, lyrics, genre,
                                speed, topic or time (default general)
  flush                       - Apply pending feedback now
  cooldown <position> [class] - Cycle the cooldown, or set short, medium, long

SESSION:
  state                       - Show seed, traits and pending work
  errors                      - Show recent errors
  clear                       - Clear the error log
  cancel                      - Cancel pending regeneration and feedback
  help                        - Show this help
  quit                        - Leave the session
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_keeps_spacing_inside() {
        assert_eq!(
            parse_session_command("  SEED  Wagon Wheel ").unwrap(),
            SessionCommand::Seed("Wagon Wheel".to_string())
        );
    }

    #[test]
    fn test_parse_seed_requires_text() {
        assert!(matches!(
            parse_session_command("seed"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_slider() {
        assert_eq!(
            parse_session_command("slider artistFame 80").unwrap(),
            SessionCommand::Slider {
                name: "artistFame".to_string(),
                value: 80
            }
        );
        assert!(matches!(
            parse_session_command("slider artistFame loud"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parse_feedback_defaults_to_general() {
        assert_eq!(
            parse_session_command("fb 3 -").unwrap(),
            SessionCommand::Feedback {
                position: 3,
                trait_kind: "general".to_string(),
                value: "-".to_string()
            }
        );
        assert_eq!(
            parse_session_command("feedback 1 speed +").unwrap(),
            SessionCommand::Feedback {
                position: 1,
                trait_kind: "speed".to_string(),
                value: "+".to_string()
            }
        );
    }

    #[test]
    fn test_parse_positions_are_one_based() {
        assert!(parse_session_command("play 0").is_err());
        assert_eq!(parse_session_command("p 1").unwrap(), SessionCommand::Play(1));
    }

    #[test]
    fn test_parse_cooldown() {
        assert_eq!(
            parse_session_command("cooldown 2").unwrap(),
            SessionCommand::Cooldown {
                position: 2,
                class: None
            }
        );
        assert_eq!(
            parse_session_command("cd 2 turtle").unwrap(),
            SessionCommand::Cooldown {
                position: 2,
                class: Some("turtle".to_string())
            }
        );
    }

    #[test]
    fn test_parse_simple_words() {
        assert_eq!(parse_session_command("").unwrap(), SessionCommand::Empty);
        assert_eq!(parse_session_command("QUIT").unwrap(), SessionCommand::Exit);
        assert_eq!(parse_session_command("?").unwrap(), SessionCommand::Help);
        assert_eq!(parse_session_command("state").unwrap(), SessionCommand::ShowState);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_session_command("dance now"),
            Err(CommandError::UnknownCommand("dance".to_string()))
        );
    }
}
