use crate::cli::CooldownCommand;
use crate::clock::{Clock, SystemClock};
use crate::commands::{display, open_preferences};
use crate::config::Config;
use crate::error::Result;
use crate::state::CooldownStore;
use crate::types::song_id;

use colored::Colorize;
use std::sync::Arc;

/// Handle cooldown commands
pub fn handle_cooldown(config: &Config, command: CooldownCommand) -> Result<()> {
    let prefs = open_preferences(config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = CooldownStore::new(Arc::clone(&prefs), Arc::clone(&clock));

    match command {
        CooldownCommand::Show => {
            display::print_cooldowns(&prefs.cooldowns(), clock.now_millis());
        }
        CooldownCommand::Cycle { title, artist } => {
            let id = song_id(&title, &artist);
            let class = store.cycle_cooldown(&id)?;
            let description = store.describe(&id);
            println!(
                "{} {} - {} is now {} ({})",
                class.icon(),
                title.bold(),
                artist,
                class.to_string().cyan(),
                description.remaining
            );
        }
        CooldownCommand::Set {
            title,
            artist,
            class,
        } => {
            let id = song_id(&title, &artist);
            let record = store.set_cooldown_named(&id, &class)?;
            println!(
                "{} {} - {} set to {} ({})",
                record.class.icon(),
                title.bold(),
                artist,
                record.class.to_string().cyan(),
                store.describe(&id).remaining
            );
        }
    }

    Ok(())
}
