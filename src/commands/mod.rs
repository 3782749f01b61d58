//! Command handlers for the CLI
//!
//! - `generate`: one-shot playlist generation
//! - `session`: interactive listening session
//! - `cooldown`: offline cooldown management
//! - `sliders`: offline slider management
//!
//! `cooldown` and `sliders` only open the preference database, so they work
//! without model credentials.

pub mod cooldown;
pub mod display;
pub mod generate;
pub mod session;
pub mod session_commands;
pub mod sliders;

use crate::config::Config;
use crate::error::Result;
use crate::state::PreferenceStore;
use crate::storage::SledStore;

use std::sync::Arc;

/// Open the preference store at the configured path
///
/// # Errors
///
/// Returns a storage error if the database cannot be opened
pub fn open_preferences(config: &Config) -> Result<Arc<PreferenceStore>> {
    let path = config.storage.resolve_path()?;
    tracing::debug!("Opening preferences at {}", path.display());
    let store = SledStore::open(&path)?;
    Ok(Arc::new(PreferenceStore::open(Arc::new(store))?))
}
