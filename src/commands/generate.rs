use crate::commands::display;
use crate::config::Config;
use crate::engine::{EngineBuilder, GenerationOutcome};
use crate::error::{Result, VibeError};

/// Generate one playlist and print it
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `seed_words` - Seed text, one element per shell word
/// * `json` - Print JSON instead of a table
///
/// # Errors
///
/// Returns an error if the engine cannot be built, the seed is empty, or
/// the cycle fails
pub async fn run_generate(config: Config, seed_words: Vec<String>, json: bool) -> Result<()> {
    let seed = seed_words.join(" ");
    let engine = EngineBuilder::new(config).build()?;

    match engine.generate_from_seed(&seed).await? {
        GenerationOutcome::Completed(playlist) => {
            if json {
                let output = serde_json::to_string_pretty(&playlist)?;
                println!("{}", output);
            } else {
                if let Some(traits) = engine.get_state().traits {
                    println!("\n{}", display::traits_line(&traits));
                }
                display::print_playlist(&playlist);
            }
            Ok(())
        }
        GenerationOutcome::Failed(message) => Err(VibeError::Generation(message).into()),
        GenerationOutcome::Queued => Ok(()),
    }
}
