//! VinylVibe - LLM-driven music recommendations
//!
#![doc = "VinylVibe - LLM-driven music recommendations"]
#![doc = "Main entry point for the VinylVibe application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vinylvibe::cli::{Cli, Commands};
use vinylvibe::commands;
use vinylvibe::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    vinylvibe::metrics::init_metrics_exporter();

    // Execute command
    match cli.command {
        Commands::Generate { seed, json } => {
            tracing::info!("Generating playlist");
            commands::generate::run_generate(config, seed, json).await?;
            Ok(())
        }
        Commands::Session { provider } => {
            tracing::info!("Starting interactive session");
            if let Some(p) = &provider {
                tracing::debug!("Using provider override: {}", p);
            }
            // Provider override was applied during Config::load
            commands::session::run_session(config).await?;
            Ok(())
        }
        Commands::Cooldown { command } => {
            tracing::debug!("Starting cooldown command");
            commands::cooldown::handle_cooldown(&config, command)?;
            Ok(())
        }
        Commands::Sliders { command } => {
            tracing::debug!("Starting sliders command");
            commands::sliders::handle_sliders(&config, command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over the verbose flag. Logs go to stderr so `--json`
/// output stays clean.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "vinylvibe=debug"
    } else {
        "vinylvibe=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
