//! VinylVibe - LLM-driven music recommendation library
//!
//! This library turns a seed (a song, an artist or a mood) into a playlist
//! by asking a language model, then keeps refining it from slider changes,
//! per-song feedback and cooldowns.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `engine`: Playlist generation, feedback batching and the facade
//! - `gateway`: Rate-limited, cached model calls and reply parsing
//! - `providers`: Model provider abstraction and implementations (OpenAI, Ollama)
//! - `prompts`: Prompt templates
//! - `state`: Session state, stored preferences and cooldowns
//! - `storage`: Key-value persistence
//! - `playback`: Streaming player integration
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use vinylvibe::{Config, EngineBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let engine = EngineBuilder::new(config).build()?;
//!     engine.generate_from_seed("Jolene by Dolly Parton").await?;
//!     for entry in engine.get_state().playlist {
//!         println!("{} - {}", entry.title, entry.artist);
//!     }
//!     Ok(())
//! }
//! ```

pub mod bounded;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod playback;
pub mod prompts;
pub mod providers;
pub mod state;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use engine::{EngineBuilder, EngineFacade, GenerationOutcome};
pub use error::{Result, VibeError};
