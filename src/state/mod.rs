//! Session and preference state
//!
//! - [`session`]: volatile per-session state (seed, traits, playlist, logs)
//! - [`preferences`]: durable sliders and cooldown table
//! - [`cooldown`]: cooldown classes and operations over the preference store

pub mod cooldown;
pub mod preferences;
pub mod session;

pub use cooldown::{
    format_remaining, CooldownClass, CooldownDescription, CooldownRecord, CooldownStore,
};
pub use preferences::{PreferenceStore, Preferences, PREFERENCES_KEY};
pub use session::{Session, SessionState};
