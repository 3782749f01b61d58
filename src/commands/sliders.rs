use crate::cli::SliderCommand;
use crate::commands::{display, open_preferences};
use crate::config::Config;
use crate::error::Result;

/// Handle slider commands
pub fn handle_sliders(config: &Config, command: SliderCommand) -> Result<()> {
    let prefs = open_preferences(config)?;

    let sliders = match command {
        SliderCommand::Show => prefs.sliders(),
        SliderCommand::Set { name, value } => prefs.set_slider(&name, value)?,
        SliderCommand::Reset => prefs.reset_sliders()?,
    };
    display::print_sliders(&sliders);

    Ok(())
}
